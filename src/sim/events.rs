//! Observable simulation events
//!
//! Expected runtime outcomes (crashes, recoveries, rejected sends,
//! migrations) are surfaced to the presentation layer as events rather
//! than errors.

use crate::swarm::{MigrationEvent, RobotId};

/// Events emitted by the simulation core
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A robot crashed; its task will never be rescheduled
    RobotFailed { robot: RobotId },

    /// The lock's crashed owner was force-released by the cleanup pass
    LockRecovered { previous_owner: RobotId },

    /// A crashed waiter was purged from the lock queue
    WaiterPurged { robot: RobotId },

    /// A robot acquired the lock and entered the critical section
    SectionEntered { robot: RobotId },

    /// A robot finished its hold, credited its counter, and released
    SectionCompleted { robot: RobotId, counter: u64 },

    /// A robot crashed mid-hold; the section was abandoned without credit
    SectionAborted { robot: RobotId },

    /// A payload was accepted into a mailbox
    MessageDelivered {
        from: RobotId,
        to: RobotId,
        depth: usize,
    },

    /// A payload bounced off a full mailbox (flow control, not an error)
    MessageRejected { from: RobotId, to: RobotId },

    /// A dead robot's accumulated work moved to its nearest survivor
    Migration(MigrationEvent),

    /// Every robot has failed; further ticks are no-ops
    AllFailed,
}
