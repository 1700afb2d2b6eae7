//! Exclusive resource lock
//!
//! Provides mutex-style locking for the single shared resource, with an
//! explicit FIFO wait queue and crash recovery.
//!
//! # Overview
//!
//! The lock tracks at most one owner and an ordered queue of waiters:
//! - Robots request the lock each scheduling turn; a denied request enqueues
//!   the robot and the caller simply retries on a later turn
//! - Grants are FIFO among currently-queued waiters: a free lock still goes
//!   to the queue head, not to whoever asks first
//! - A cleanup pass runs before every grant decision, force-releasing a
//!   crashed owner and purging crashed waiters, so a dead holder can never
//!   starve the queue and the lock stays decoupled from the failure detector
//!
//! # Example
//!
//! ```
//! use gridswarm::lock::ResourceLock;
//! use gridswarm::swarm::{Position, Robot, RobotId};
//!
//! let robots = vec![
//!     Robot::new(RobotId(0), Position { x: 0, y: 0 }),
//!     Robot::new(RobotId(1), Position { x: 1, y: 1 }),
//! ];
//!
//! let mut lock = ResourceLock::new();
//!
//! assert!(lock.request(RobotId(0), &robots).is_granted());
//! assert!(!lock.request(RobotId(1), &robots).is_granted());
//!
//! lock.release(RobotId(0));
//! assert!(lock.request(RobotId(1), &robots).is_granted());
//! ```

use crate::swarm::{Robot, RobotId};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Result of a lock request
///
/// A denied request is not an error; the robot has been queued (if it was
/// not already) and should retry on a later scheduling turn. The recovery
/// fields report what the cleanup pass found so the caller can surface the
/// force-release and purges as observable events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// Whether the caller now holds the lock
    pub granted: bool,

    /// Crashed owner whose stale hold was force-released during cleanup
    pub recovered_from: Option<RobotId>,

    /// Crashed waiters purged from the queue during cleanup
    pub purged_waiters: Vec<RobotId>,
}

impl RequestOutcome {
    /// Whether the caller now holds the lock
    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// The single shared exclusive resource
///
/// Per-robot state machine: `Idle -> Waiting -> Holding -> Idle`.
#[derive(Debug, Default)]
pub struct ResourceLock {
    /// Current holder, if any
    owner: Option<RobotId>,

    /// Robots waiting for the resource, FIFO, no duplicates
    wait_queue: VecDeque<RobotId>,
}

impl ResourceLock {
    /// Create a new, unheld lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner, if any
    pub fn owner(&self) -> Option<RobotId> {
        self.owner
    }

    /// Ids currently waiting, in grant order
    pub fn waiters(&self) -> Vec<RobotId> {
        self.wait_queue.iter().copied().collect()
    }

    /// Attempt to acquire the lock for `id`
    ///
    /// Runs the crash cleanup pass first, then applies FIFO fairness:
    /// the lock is granted iff it is free and `id` is the queue head (or the
    /// queue is empty). An already-holding robot is re-confirmed without
    /// side effects. A denied caller is appended to the queue at most once.
    pub fn request(&mut self, id: RobotId, robots: &[Robot]) -> RequestOutcome {
        let (recovered_from, purged_waiters) = self.purge_failed(robots);

        let mut outcome = RequestOutcome {
            granted: false,
            recovered_from,
            purged_waiters,
        };

        // Idempotent re-entrant check for a task already holding the lock
        if self.owner == Some(id) {
            outcome.granted = true;
            return outcome;
        }

        if self.owner.is_none() {
            let head = self.wait_queue.front().copied();
            if head.is_none() || head == Some(id) {
                self.owner = Some(id);
                if head == Some(id) {
                    self.wait_queue.pop_front();
                }
                debug!("lock granted to {}", id);
                outcome.granted = true;
                return outcome;
            }
        }

        // Busy, or free but an earlier waiter is owed the next grant
        if !self.wait_queue.contains(&id) {
            self.wait_queue.push_back(id);
            debug!("{} queued for lock (position {})", id, self.wait_queue.len());
        }

        outcome
    }

    /// Release the lock held by `id`
    ///
    /// A release by a robot that is not the owner is a no-op, not an error.
    /// Returns whether the lock was actually released.
    pub fn release(&mut self, id: RobotId) -> bool {
        if self.owner == Some(id) {
            self.owner = None;
            debug!("lock released by {}", id);
            true
        } else {
            false
        }
    }

    /// Crash cleanup: force-release a dead owner and drop dead waiters
    ///
    /// Models process-crash-while-holding-resource recovery. Waiters are
    /// purged lazily here rather than by the failure detector, preserving
    /// the relative order of the survivors. An id with no matching robot in
    /// the snapshot is treated as dead.
    fn purge_failed(&mut self, robots: &[Robot]) -> (Option<RobotId>, Vec<RobotId>) {
        let mut recovered = None;

        if let Some(owner) = self.owner {
            let owner_failed = robots
                .iter()
                .find(|r| r.id == owner)
                .map_or(true, |r| r.failed);
            if owner_failed {
                info!("lock owner {} crashed; force releasing", owner);
                self.owner = None;
                recovered = Some(owner);
            }
        }

        let mut purged = Vec::new();
        self.wait_queue.retain(|id| {
            let alive = robots.iter().any(|r| r.id == *id && r.is_alive());
            if !alive {
                debug!("purging crashed waiter {} from lock queue", id);
                purged.push(*id);
            }
            alive
        });

        (recovered, purged)
    }
}
