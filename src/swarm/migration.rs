//! Failure detection and task migration
//!
//! Once per tick, before the scheduler runs, the coordinator scans for
//! robots that crashed since the last pass and moves their accumulated work
//! onto the nearest surviving robot. Each crash is handled exactly once,
//! tracked by the robot's `death_handled` flag.

use crate::mail::{MailboxRegistry, SendOutcome};
use crate::sim::SimEvent;
use crate::swarm::{Robot, RobotId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Record of one completed migration, for observer consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationEvent {
    /// The crashed robot whose work moved
    pub from: RobotId,

    /// The surviving robot that inherited it
    pub to: RobotId,

    /// Counter units transferred
    pub transferred: u64,

    /// When the migration ran
    pub occurred_at: DateTime<Utc>,
}

/// Handle every newly-crashed robot, transferring its counter to the
/// nearest survivor
///
/// Targets are chosen by Euclidean distance over the *current* alive set,
/// ties broken by the first robot encountered in ascending id order, which
/// keeps runs reproducible. The inheritor also gets a system note in its
/// mailbox; a full mailbox simply drops it. With no survivors the crash is
/// marked handled without transfer; the all-failed halt is the
/// simulation's to signal.
pub fn run_migration_pass(
    robots: &mut [Robot],
    mail: &mut MailboxRegistry,
    events: &mut Vec<SimEvent>,
) -> Vec<MigrationEvent> {
    let newly_dead: Vec<usize> = robots
        .iter()
        .enumerate()
        .filter(|(_, r)| r.failed && !r.death_handled)
        .map(|(i, _)| i)
        .collect();

    let mut migrations = Vec::new();

    for dead_idx in newly_dead {
        let dead_id = robots[dead_idx].id;
        let dead_pos = robots[dead_idx].position;

        let mut nearest: Option<(usize, f64)> = None;
        for (i, robot) in robots.iter().enumerate() {
            if robot.failed {
                continue;
            }
            let distance = robot.position.distance_to(dead_pos);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((i, distance));
            }
        }

        match nearest {
            Some((target_idx, _)) => {
                let transferred = robots[dead_idx].shared_counter;
                robots[dead_idx].shared_counter = 0;
                robots[dead_idx].death_handled = true;

                let target_id = robots[target_idx].id;
                robots[target_idx].shared_counter += transferred;

                info!(
                    "{} died; {} work units migrated to {}",
                    dead_id, transferred, target_id
                );

                match mail.send(
                    RobotId::SYSTEM,
                    target_id,
                    format!("inherited work from {}", dead_id),
                ) {
                    Ok(SendOutcome::Accepted { .. }) => {}
                    Ok(SendOutcome::Rejected) => {
                        debug!("{} mailbox full; inheritance note dropped", target_id)
                    }
                    Err(err) => warn!("inheritance note to {} failed: {}", target_id, err),
                }

                let event = MigrationEvent {
                    from: dead_id,
                    to: target_id,
                    transferred,
                    occurred_at: Utc::now(),
                };
                events.push(SimEvent::Migration(event.clone()));
                migrations.push(event);
            }
            None => {
                // No survivor to inherit; the counter is never read again
                robots[dead_idx].death_handled = true;
                debug!("{} died with no surviving robots", dead_id);
            }
        }
    }

    migrations
}
