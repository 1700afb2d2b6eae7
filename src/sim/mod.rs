//! Simulation core
//!
//! Owns all shared state (the robot set, the mailbox registry, the
//! resource lock, the scheduler) and composes the per-tick control flow:
//! the migration coordinator runs first, then exactly one task is advanced
//! one suspension step. The driving loop calls [`Simulation::tick`] once
//! per frame/iteration and reads results through [`Simulation::snapshot`]
//! and registered event listeners.
//!
//! # Example
//!
//! ```
//! use gridswarm::config::SimConfig;
//! use gridswarm::sim::Simulation;
//!
//! let config = SimConfig {
//!     robots: 4,
//!     seed: Some(42),
//!     ..SimConfig::default()
//! };
//!
//! let mut sim = Simulation::new(config).unwrap();
//! let report = sim.tick();
//! assert_eq!(report.tick, 1);
//!
//! let snapshot = sim.snapshot();
//! assert_eq!(snapshot.robots.len(), 4);
//! ```

mod events;
mod snapshot;

pub use events::SimEvent;
pub use snapshot::{MailboxDepth, RobotSnapshot, SimSnapshot, TickReport};

use crate::config::{validate_config, SimConfig};
use crate::lock::ResourceLock;
use crate::mail::MailboxRegistry;
use crate::swarm::{
    run_migration_pass, MigrationEvent, Position, Robot, RobotId, RobotTask, Scheduler,
    StepContext,
};
use crate::{GridSwarmError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// Type alias for event listener collection to reduce complexity
type EventListeners = Vec<Box<dyn Fn(&SimEvent)>>;

/// The simulation driver
///
/// All component lifetimes equal the simulation run: robots are created at
/// startup and never destroyed, mailboxes are registered once per robot,
/// and the lock and scheduler live as long as the simulation.
pub struct Simulation {
    config: SimConfig,
    robots: Vec<Robot>,
    mail: MailboxRegistry,
    lock: ResourceLock,
    scheduler: Scheduler,
    rng: SmallRng,
    ticks: u64,
    halted: bool,
    last_migration: Option<MigrationEvent>,
    listeners: EventListeners,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("robots", &self.robots)
            .field("mail", &self.mail)
            .field("lock", &self.lock)
            .field("scheduler", &self.scheduler)
            .field("ticks", &self.ticks)
            .field("halted", &self.halted)
            .field("last_migration", &self.last_migration)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Simulation {
    /// Build a simulation from a validated configuration
    ///
    /// Robots spawn at uniformly random grid positions (overlaps permitted
    /// at spawn; movement keeps cells exclusive afterwards), each with an
    /// empty mailbox and a fresh task at the back of the ready queue.
    ///
    /// # Errors
    ///
    /// Returns [`GridSwarmError::Config`] if the configuration fails
    /// validation.
    pub fn new(config: SimConfig) -> Result<Self> {
        if let Err(errors) = validate_config(&config) {
            let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(GridSwarmError::Config(details.join("; ")));
        }

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let grid = config.grid();
        let mut robots = Vec::with_capacity(config.robots as usize);
        let mut mail = MailboxRegistry::new(config.buffer_limit);
        let mut scheduler = Scheduler::new();

        for i in 0..config.robots {
            let id = RobotId(i);
            let position = Position {
                x: rng.gen_range(0..grid.width),
                y: rng.gen_range(0..grid.height),
            };
            robots.push(Robot::new(id, position));
            mail.register(id);
            scheduler.add_task(RobotTask::new(id));
        }

        info!("simulation started with {} robots", config.robots);

        Ok(Self {
            config,
            robots,
            mail,
            lock: ResourceLock::new(),
            scheduler,
            rng,
            ticks: 0,
            halted: false,
            last_migration: None,
            listeners: Vec::new(),
        })
    }

    /// Register an event listener (for the presentation layer, logging, etc.)
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&SimEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Advance the simulation by one tick
    ///
    /// Runs the migration pass, then one scheduler turn. Once every robot
    /// has failed the halt condition is signalled exactly once and further
    /// ticks are no-ops (no live tasks remain, migration has nothing to do).
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let mut events = Vec::new();

        let migrations = run_migration_pass(&mut self.robots, &mut self.mail, &mut events);
        if let Some(last) = migrations.last() {
            self.last_migration = Some(last.clone());
        }

        let ran = self.scheduler.run_one(&mut StepContext {
            robots: &mut self.robots,
            lock: &mut self.lock,
            mail: &mut self.mail,
            rng: &mut self.rng,
            config: &self.config,
            events: &mut events,
        });

        if !self.halted && self.robots.iter().all(|r| r.failed) {
            self.halted = true;
            warn!("all robots have failed; simulation halted");
            events.push(SimEvent::AllFailed);
        }

        for event in &events {
            self.emit(event);
        }

        TickReport {
            tick: self.ticks,
            ran,
            migrations: migrations.len(),
            halted: self.halted,
        }
    }

    fn emit(&self, event: &SimEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Published read-only view of the current state
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.ticks,
            halted: self.halted,
            robots: self
                .robots
                .iter()
                .map(|r| RobotSnapshot {
                    id: r.id,
                    position: r.position,
                    failed: r.failed,
                    in_critical_section: r.in_critical_section,
                    shared_counter: r.shared_counter,
                })
                .collect(),
            buffer_limit: self.mail.buffer_limit(),
            mailbox_depths: self
                .robots
                .iter()
                .map(|r| MailboxDepth {
                    robot: r.id,
                    depth: self.mail.depth(r.id).unwrap_or(0),
                })
                .collect(),
            last_delivery: self.mail.last_delivery().cloned(),
            last_migration: self.last_migration.clone(),
            ready: self.scheduler.statuses(),
            lock_owner: self.lock.owner(),
            lock_waiters: self.lock.waiters(),
        }
    }

    /// Whether every robot has failed
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Ticks advanced so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The robot set, in id order
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// The shared resource lock
    pub fn lock(&self) -> &ResourceLock {
        &self.lock
    }

    /// The mailbox registry
    pub fn mail(&self) -> &MailboxRegistry {
        &self.mail
    }

    /// The run configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
