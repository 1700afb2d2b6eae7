//! Cooperative robot task
//!
//! Every robot runs the same task logic, parameterized by its id. The
//! original coroutine shape (run until `yield`) is expressed as an explicit
//! state machine: the scheduler calls [`RobotTask::step`] once per turn, the
//! task dispatches on its current phase, and the phase field records where
//! execution resumes next turn.
//!
//! One suspension step in the `Working` phase performs, in order: the
//! failure roll, a bounded random move, a lock attempt (entering the
//! critical section on success), a probabilistic send, and one receive.
//! The `Holding` phase counts down the simulated work inside the critical
//! section, one turn per unit, then credits the shared counter and releases.

use crate::config::SimConfig;
use crate::lock::ResourceLock;
use crate::mail::{MailboxRegistry, SendOutcome};
use crate::sim::SimEvent;
use crate::swarm::{Robot, RobotId};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// Attempts at finding an unoccupied neighboring cell before giving up
/// for the step. Not moving is not an error.
pub const MOVE_ATTEMPTS: usize = 15;

/// Where a task resumes on its next scheduling turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// Top of the decision sequence
    Working,

    /// Inside the critical section, `remaining` turns of simulated work left
    Holding { remaining: u32 },
}

/// Result of advancing a task by one suspension step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The task yielded and wants another turn
    Yielded,

    /// The task ended permanently (robot crashed); never reschedule it
    Terminated,
}

/// Published read-only task status for the presentation layer
///
/// The observer consumes these snapshots instead of reaching into task
/// internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    /// The robot this task drives
    pub robot: RobotId,

    /// Current phase
    pub phase: TaskPhase,
}

/// Shared handles a task step operates on
///
/// The simulation owns all of this state; a context is borrowed afresh for
/// each step, which makes the mutation rights explicit: a task writes its
/// own robot, the lock, the mailboxes, and the event buffer, and reads
/// everything else.
pub struct StepContext<'a> {
    /// The full robot set (own robot mutated, peers read for collisions
    /// and send targets)
    pub robots: &'a mut [Robot],

    /// The shared exclusive resource
    pub lock: &'a mut ResourceLock,

    /// The mailbox registry
    pub mail: &'a mut MailboxRegistry,

    /// Simulation RNG
    pub rng: &'a mut SmallRng,

    /// Run configuration (probabilities, grid bounds, hold duration)
    pub config: &'a SimConfig,

    /// Buffer for events produced during this step
    pub events: &'a mut Vec<SimEvent>,
}

/// A suspendable cooperative task driving one robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotTask {
    robot: RobotId,
    phase: TaskPhase,
}

impl RobotTask {
    /// Create a task for `robot`, starting at the top of the loop
    pub fn new(robot: RobotId) -> Self {
        Self {
            robot,
            phase: TaskPhase::Working,
        }
    }

    /// The robot this task drives
    pub fn robot(&self) -> RobotId {
        self.robot
    }

    /// Published status snapshot
    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            robot: self.robot,
            phase: self.phase,
        }
    }

    /// Advance the task by exactly one suspension step
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let Some(idx) = ctx.robots.iter().position(|r| r.id == self.robot) else {
            warn!("no robot state for {}; dropping task", self.robot);
            return StepOutcome::Terminated;
        };

        match self.phase {
            TaskPhase::Working => self.working_step(ctx, idx),
            TaskPhase::Holding { .. } => self.holding_step(ctx, idx),
        }
    }

    /// One pass through the top of the decision sequence
    fn working_step(&mut self, ctx: &mut StepContext<'_>, idx: usize) -> StepOutcome {
        // 1. Failure roll: crash permanently with the configured probability
        if ctx.rng.gen_bool(ctx.config.failure_probability) {
            ctx.robots[idx].fail();
            warn!("{} crashed", self.robot);
            ctx.events.push(SimEvent::RobotFailed { robot: self.robot });
            return StepOutcome::Terminated;
        }

        // 2. Bounded random move, rejecting occupied cells
        self.try_move(ctx, idx);

        // 3. Attempt the lock; on success enter the critical section and
        //    suspend for the configured hold duration
        if !ctx.robots[idx].in_critical_section {
            let outcome = ctx.lock.request(self.robot, &*ctx.robots);
            self.publish_lock_recovery(ctx, &outcome.recovered_from, &outcome.purged_waiters);

            if outcome.is_granted() {
                ctx.robots[idx].in_critical_section = true;
                debug!("{} entered critical section", self.robot);
                ctx.events.push(SimEvent::SectionEntered { robot: self.robot });
                self.phase = TaskPhase::Holding {
                    remaining: ctx.config.hold_steps,
                };
                return StepOutcome::Yielded;
            }
        }

        // 4 & 5. Messaging
        self.maybe_send(ctx);
        self.drain_one(ctx);

        StepOutcome::Yielded
    }

    /// One turn of simulated work inside the critical section
    fn holding_step(&mut self, ctx: &mut StepContext<'_>, idx: usize) -> StepOutcome {
        // A robot that failed since entering must abandon the section with
        // no counter credit; the lock's cleanup pass reclaims ownership
        if ctx.robots[idx].failed {
            ctx.robots[idx].in_critical_section = false;
            warn!("{} crashed mid-hold; abandoning critical section", self.robot);
            ctx.events.push(SimEvent::SectionAborted { robot: self.robot });
            return StepOutcome::Terminated;
        }

        if let TaskPhase::Holding { remaining } = &mut self.phase {
            if *remaining > 1 {
                *remaining -= 1;
                return StepOutcome::Yielded;
            }
        }

        // Hold complete: credit the shared state, release, resume the loop
        let robot = &mut ctx.robots[idx];
        robot.shared_counter += 1;
        let counter = robot.shared_counter;
        ctx.lock.release(self.robot);
        ctx.robots[idx].in_critical_section = false;
        debug!("{} exited critical section (counter {})", self.robot, counter);
        ctx.events.push(SimEvent::SectionCompleted {
            robot: self.robot,
            counter,
        });
        self.phase = TaskPhase::Working;

        self.maybe_send(ctx);
        self.drain_one(ctx);

        StepOutcome::Yielded
    }

    /// Random ±1 step in each axis, clamped to the grid, skipping cells
    /// occupied by any other robot (live or dead)
    fn try_move(&self, ctx: &mut StepContext<'_>, idx: usize) {
        let grid = ctx.config.grid();
        let current = ctx.robots[idx].position;

        for _ in 0..MOVE_ATTEMPTS {
            let dx: i32 = ctx.rng.gen_range(-1..=1);
            let dy: i32 = ctx.rng.gen_range(-1..=1);
            let candidate = grid.clamp(current.x + dx, current.y + dy);

            let occupied = ctx
                .robots
                .iter()
                .any(|r| r.id != self.robot && r.position == candidate);
            if !occupied {
                ctx.robots[idx].position = candidate;
                return;
            }
        }
    }

    /// With the configured probability, send a short tagged payload to a
    /// uniformly random live peer
    fn maybe_send(&self, ctx: &mut StepContext<'_>) {
        if !ctx.rng.gen_bool(ctx.config.send_probability) {
            return;
        }

        let targets: Vec<RobotId> = ctx
            .robots
            .iter()
            .filter(|r| r.is_alive() && r.id != self.robot)
            .map(|r| r.id)
            .collect();
        if targets.is_empty() {
            return;
        }
        let target = targets[ctx.rng.gen_range(0..targets.len())];

        let payload = format!("data from {}", self.robot);
        match ctx.mail.send(self.robot, target, payload) {
            Ok(SendOutcome::Accepted { depth }) => {
                ctx.events.push(SimEvent::MessageDelivered {
                    from: self.robot,
                    to: target,
                    depth,
                });
            }
            Ok(SendOutcome::Rejected) => {
                ctx.events.push(SimEvent::MessageRejected {
                    from: self.robot,
                    to: target,
                });
            }
            Err(err) => warn!("{} failed to send to {}: {}", self.robot, target, err),
        }
    }

    /// Unconditionally pop one pending payload, if any
    fn drain_one(&self, ctx: &mut StepContext<'_>) {
        match ctx.mail.receive(self.robot) {
            Ok(Some(payload)) => debug!("{} received '{}'", self.robot, payload),
            Ok(None) => {}
            Err(err) => warn!("{} failed to receive: {}", self.robot, err),
        }
    }

    fn publish_lock_recovery(
        &self,
        ctx: &mut StepContext<'_>,
        recovered_from: &Option<RobotId>,
        purged_waiters: &[RobotId],
    ) {
        if let Some(previous_owner) = recovered_from {
            ctx.events.push(SimEvent::LockRecovered {
                previous_owner: *previous_owner,
            });
        }
        for robot in purged_waiters {
            ctx.events.push(SimEvent::WaiterPurged { robot: *robot });
        }
    }
}
