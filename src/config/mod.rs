//! Configuration system
//!
//! Construction-time tuning for a simulation run, loaded from
//! ~/.config/gridswarm/config.yaml (or a path given on the command line):
//! - Robot count and grid bounds
//! - Mailbox capacity
//! - Failure, hold, and messaging parameters
//! - Optional RNG seed for reproducible runs
//! - Driver tick rate

mod sim_config;
pub mod validation;

pub use sim_config::SimConfig;
pub use validation::{validate_config, ValidationError, ValidationResult};
