//! Robot state
//!
//! Defines the Robot struct shared between the task logic, the migration
//! coordinator, and the presentation observer, along with its id and grid
//! position types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a robot, unique for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(pub u32);

impl RobotId {
    /// Reserved sender id used by the coordinator for system notifications
    /// (e.g. the "inherited work" note delivered on migration).
    pub const SYSTEM: RobotId = RobotId(u32::MAX);
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::SYSTEM {
            write!(f, "system")
        } else {
            write!(f, "robot-{}", self.0)
        }
    }
}

/// Rectangular grid bounds, cells addressed from (0, 0) inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Number of columns
    pub width: i32,

    /// Number of rows
    pub height: i32,
}

impl Grid {
    /// Total number of cells
    pub fn cells(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Clamp a coordinate pair into bounds
    pub fn clamp(&self, x: i32, y: i32) -> Position {
        Position {
            x: x.clamp(0, self.width - 1),
            y: y.clamp(0, self.height - 1),
        }
    }
}

/// A 2D integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Euclidean distance to another position
    pub fn distance_to(&self, other: Position) -> f64 {
        ((self.x - other.x) as f64).hypot((self.y - other.y) as f64)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A simulated robot process
///
/// Robots are created once at startup and never removed from the robot set;
/// a crashed robot stays visible (with `failed` set) for inspection and for
/// the migration coordinator. The fields are mutated only by the robot's own
/// task step or, for `shared_counter` and `death_handled`, by the migration
/// coordinator after the robot is confirmed dead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    /// Unique identifier
    pub id: RobotId,

    /// Current grid position
    pub position: Position,

    /// Permanently true once the robot has crashed
    pub failed: bool,

    /// Set exactly once by the migration coordinator after a crash
    pub death_handled: bool,

    /// Work units accumulated inside the critical section
    pub shared_counter: u64,

    /// True while the robot holds the shared resource
    pub in_critical_section: bool,
}

impl Robot {
    /// Create a new live robot at the given position
    pub fn new(id: RobotId, position: Position) -> Self {
        Self {
            id,
            position,
            failed: false,
            death_handled: false,
            shared_counter: 0,
            in_critical_section: false,
        }
    }

    /// Whether the robot is still running
    pub fn is_alive(&self) -> bool {
        !self.failed
    }

    /// Mark the robot as permanently crashed
    ///
    /// Clears the critical-section flag; the lock itself is recovered lazily
    /// by the cleanup pass on the next `request` call.
    pub fn fail(&mut self) {
        self.failed = true;
        self.in_critical_section = false;
    }
}
