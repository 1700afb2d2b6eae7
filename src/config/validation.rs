//! Configuration validation
//!
//! Validates a simulation configuration for correctness:
//! - Counts and sizes are non-zero
//! - Probabilities are real numbers in [0, 1]
//! - The robot population fits on the grid

use super::sim_config::SimConfig;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a simulation configuration
pub fn validate_config(config: &SimConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.robots == 0 {
        errors.push(ValidationError::new("robots", "At least one robot required"));
    }

    if config.grid_width < 1 {
        errors.push(ValidationError::new(
            "grid_width",
            "Grid must be at least one cell wide",
        ));
    }
    if config.grid_height < 1 {
        errors.push(ValidationError::new(
            "grid_height",
            "Grid must be at least one cell tall",
        ));
    }

    if config.grid_width >= 1 && config.grid_height >= 1 {
        let cells = config.grid_width as i64 * config.grid_height as i64;
        if config.robots as i64 > cells {
            errors.push(ValidationError::new(
                "robots",
                format!(
                    "{} robots cannot occupy a grid of {} cells",
                    config.robots, cells
                ),
            ));
        }
    }

    if config.buffer_limit == 0 {
        errors.push(ValidationError::new(
            "buffer_limit",
            "Mailboxes must hold at least one payload",
        ));
    }

    if config.hold_steps == 0 {
        errors.push(ValidationError::new(
            "hold_steps",
            "Critical section must last at least one step",
        ));
    }

    validate_probability(&mut errors, "failure_probability", config.failure_probability);
    validate_probability(&mut errors, "send_probability", config.send_probability);

    if config.tick_interval_ms == 0 {
        errors.push(ValidationError::new(
            "tick_interval_ms",
            "Tick interval must be at least 1ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_probability(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::new(
            field,
            format!("Probability must be within [0, 1], got {}", value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SimConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_robots_rejected() {
        let config = SimConfig {
            robots: 0,
            ..SimConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "robots"));
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let config = SimConfig {
            failure_probability: 1.5,
            send_probability: -0.1,
            ..SimConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_overcrowded_grid_rejected() {
        let config = SimConfig {
            robots: 5,
            grid_width: 2,
            grid_height: 2,
            ..SimConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "robots"));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("robots", "At least one robot required");
        assert_eq!(err.to_string(), "robots: At least one robot required");
    }
}
