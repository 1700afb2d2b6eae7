//! Read-only simulation snapshots
//!
//! The presentation layer never reaches into live state; it consumes the
//! published snapshots here, taken between ticks.

use crate::mail::Delivery;
use crate::swarm::{MigrationEvent, Position, RobotId, TaskStatus};
use serde::Serialize;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,

    /// Robot whose task was advanced this tick, if any task remained
    pub ran: Option<RobotId>,

    /// Migrations performed by the coordinator pass
    pub migrations: usize,

    /// Whether the all-failed halt condition has been reached
    pub halted: bool,
}

/// Point-in-time view of one robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RobotSnapshot {
    pub id: RobotId,
    pub position: Position,
    pub failed: bool,
    pub in_critical_section: bool,
    pub shared_counter: u64,
}

/// Mailbox depth for one robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MailboxDepth {
    pub robot: RobotId,
    pub depth: usize,
}

/// Complete observer-facing view of the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    /// Ticks advanced so far
    pub tick: u64,

    /// Whether every robot has failed
    pub halted: bool,

    /// Robots in id order
    pub robots: Vec<RobotSnapshot>,

    /// Configured per-mailbox capacity
    pub buffer_limit: usize,

    /// Mailbox depths in robot id order
    pub mailbox_depths: Vec<MailboxDepth>,

    /// Most recent accepted delivery
    pub last_delivery: Option<Delivery>,

    /// Most recent completed migration
    pub last_migration: Option<MigrationEvent>,

    /// Ready-queue membership with published task phases, in scheduling order
    pub ready: Vec<TaskStatus>,

    /// Current lock holder
    pub lock_owner: Option<RobotId>,

    /// Lock wait queue in grant order
    pub lock_waiters: Vec<RobotId>,
}
