//! Cooperative scheduler
//!
//! A single ready queue of suspendable robot tasks, advanced one suspension
//! step at a time in strict FIFO round-robin order. There is no priority
//! and no preemption; a task leaves the rotation only by terminating.

use crate::swarm::{RobotId, RobotTask, StepContext, StepOutcome, TaskStatus};
use std::collections::VecDeque;
use tracing::debug;

/// FIFO round-robin ready queue
///
/// Invariant: each robot has at most one task handle in the queue; a
/// terminated task is dropped permanently.
#[derive(Debug, Default)]
pub struct Scheduler {
    ready: VecDeque<RobotTask>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the back of the ready queue
    pub fn add_task(&mut self, task: RobotTask) {
        debug_assert!(
            self.ready.iter().all(|t| t.robot() != task.robot()),
            "one task handle per robot"
        );
        self.ready.push_back(task);
    }

    /// Advance the front task by exactly one suspension step
    ///
    /// A task that yields is rotated to the back; a terminated task is
    /// dropped. Returns the id of the robot that ran, or `None` if the
    /// queue is empty.
    pub fn run_one(&mut self, ctx: &mut StepContext<'_>) -> Option<RobotId> {
        let mut task = self.ready.pop_front()?;
        let id = task.robot();

        match task.step(ctx) {
            StepOutcome::Yielded => self.ready.push_back(task),
            StepOutcome::Terminated => debug!("task for {} left the rotation", id),
        }

        Some(id)
    }

    /// Ids currently in the ready queue, in scheduling order
    pub fn ready_ids(&self) -> Vec<RobotId> {
        self.ready.iter().map(|t| t.robot()).collect()
    }

    /// Published status snapshots of every queued task, in scheduling order
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.ready.iter().map(|t| t.status()).collect()
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Whether no live tasks remain
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::lock::ResourceLock;
    use crate::mail::MailboxRegistry;
    use crate::swarm::{Position, Robot};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn world(robots: u32, config: &SimConfig) -> (Vec<Robot>, ResourceLock, MailboxRegistry) {
        let mut set = Vec::new();
        let mut mail = MailboxRegistry::new(config.buffer_limit);
        for i in 0..robots {
            let id = RobotId(i);
            set.push(Robot::new(id, Position { x: i as i32, y: 0 }));
            mail.register(id);
        }
        (set, ResourceLock::new(), mail)
    }

    #[test]
    fn test_round_robin_visits_each_task_once() {
        let config = SimConfig {
            failure_probability: 0.0,
            send_probability: 0.0,
            ..SimConfig::default()
        };
        let (mut robots, mut lock, mut mail) = world(4, &config);
        // Park the lock elsewhere so tasks never enter the holding phase
        robots.push(Robot::new(RobotId(99), Position { x: 9, y: 9 }));
        lock.request(RobotId(99), &robots);

        let mut scheduler = Scheduler::new();
        for i in 0..4 {
            scheduler.add_task(RobotTask::new(RobotId(i)));
        }
        let mut rng = SmallRng::seed_from_u64(1);
        let mut events = Vec::new();

        // N calls visit each task exactly once, in insertion order
        let mut ran = Vec::new();
        for _ in 0..4 {
            let id = scheduler
                .run_one(&mut StepContext {
                    robots: &mut robots,
                    lock: &mut lock,
                    mail: &mut mail,
                    rng: &mut rng,
                    config: &config,
                    events: &mut events,
                })
                .unwrap();
            ran.push(id);
        }

        assert_eq!(ran, vec![RobotId(0), RobotId(1), RobotId(2), RobotId(3)]);
        assert_eq!(
            scheduler.ready_ids(),
            vec![RobotId(0), RobotId(1), RobotId(2), RobotId(3)]
        );
    }

    #[test]
    fn test_terminated_task_is_dropped() {
        let config = SimConfig {
            failure_probability: 1.0,
            send_probability: 0.0,
            ..SimConfig::default()
        };
        let (mut robots, mut lock, mut mail) = world(2, &config);
        let mut scheduler = Scheduler::new();
        scheduler.add_task(RobotTask::new(RobotId(0)));
        scheduler.add_task(RobotTask::new(RobotId(1)));
        let mut rng = SmallRng::seed_from_u64(1);
        let mut events = Vec::new();

        scheduler.run_one(&mut StepContext {
            robots: &mut robots,
            lock: &mut lock,
            mail: &mut mail,
            rng: &mut rng,
            config: &config,
            events: &mut events,
        });

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.ready_ids(), vec![RobotId(1)]);
    }

    #[test]
    fn test_empty_queue_is_a_noop() {
        let config = SimConfig::default();
        let (mut robots, mut lock, mut mail) = world(0, &config);
        let mut scheduler = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut events = Vec::new();

        let ran = scheduler.run_one(&mut StepContext {
            robots: &mut robots,
            lock: &mut lock,
            mail: &mut mail,
            rng: &mut rng,
            config: &config,
            events: &mut events,
        });

        assert!(ran.is_none());
        assert!(scheduler.is_empty());
    }
}
