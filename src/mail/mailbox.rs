//! Bounded per-robot mailboxes
//!
//! Inter-robot communication is a set of bounded FIFO buffers, one per
//! registered robot. A full buffer rejects new payloads (flow control, not
//! an error); the sender is expected to treat a rejection as a no-op and
//! try again later.

use crate::swarm::RobotId;
use crate::{GridSwarmError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Result of a send operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Payload appended to the recipient's buffer
    Accepted {
        /// Buffer depth after the append
        depth: usize,
    },

    /// Buffer was full; payload dropped, buffer unchanged
    Rejected,
}

impl SendOutcome {
    /// Whether the payload was delivered
    pub fn is_accepted(&self) -> bool {
        matches!(self, SendOutcome::Accepted { .. })
    }
}

/// Record of the most recently accepted delivery, for observer consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    /// Sender id
    pub from: RobotId,

    /// Recipient id
    pub to: RobotId,

    /// The delivered payload
    pub payload: String,

    /// When the delivery was accepted
    pub delivered_at: DateTime<Utc>,
}

/// Registry of bounded per-robot mailboxes
///
/// Buffers are bounded deques sized at the process-wide `buffer_limit`;
/// depth can never exceed it. Mailboxes are created by [`register`] and are
/// never destroyed; a crashed robot's mailbox stays inspectable.
///
/// [`register`]: MailboxRegistry::register
#[derive(Debug)]
pub struct MailboxRegistry {
    /// Per-robot buffers, oldest payload at the front
    boxes: HashMap<RobotId, VecDeque<String>>,

    /// Maximum buffered payloads per robot
    buffer_limit: usize,

    /// Most recent accepted delivery
    last_delivery: Option<Delivery>,
}

impl MailboxRegistry {
    /// Create a registry with the given per-mailbox capacity
    pub fn new(buffer_limit: usize) -> Self {
        Self {
            boxes: HashMap::new(),
            buffer_limit,
            last_delivery: None,
        }
    }

    /// Create (or reset to empty) the mailbox for `id`
    ///
    /// Must be called before any send or receive referencing `id`.
    pub fn register(&mut self, id: RobotId) {
        self.boxes
            .insert(id, VecDeque::with_capacity(self.buffer_limit));
    }

    /// Whether a mailbox exists for `id`
    pub fn is_registered(&self, id: RobotId) -> bool {
        self.boxes.contains_key(&id)
    }

    /// Send `payload` from `from` to `to`
    ///
    /// Accepts iff the recipient's buffer has room; a full buffer rejects
    /// the payload and leaves the buffer unchanged. Only an accepted send
    /// updates the last-delivery record.
    ///
    /// # Errors
    ///
    /// Returns [`GridSwarmError::UnknownRecipient`] if `to` was never
    /// registered, a programming precondition violation, fatal to the call
    /// but not to the simulation.
    pub fn send(
        &mut self,
        from: RobotId,
        to: RobotId,
        payload: impl Into<String>,
    ) -> Result<SendOutcome> {
        let mailbox = self
            .boxes
            .get_mut(&to)
            .ok_or(GridSwarmError::UnknownRecipient(to))?;

        if mailbox.len() >= self.buffer_limit {
            debug!("{} rejected payload from {}: buffer full", to, from);
            return Ok(SendOutcome::Rejected);
        }

        let payload = payload.into();
        mailbox.push_back(payload.clone());
        let depth = mailbox.len();

        self.last_delivery = Some(Delivery {
            from,
            to,
            payload,
            delivered_at: Utc::now(),
        });

        debug!("{} -> {} delivered ({}/{})", from, to, depth, self.buffer_limit);
        Ok(SendOutcome::Accepted { depth })
    }

    /// Pop the oldest payload for `id`, if any
    ///
    /// Never blocks; an empty mailbox returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GridSwarmError::UnknownRobot`] if `id` was never registered.
    pub fn receive(&mut self, id: RobotId) -> Result<Option<String>> {
        let mailbox = self
            .boxes
            .get_mut(&id)
            .ok_or(GridSwarmError::UnknownRobot(id))?;
        Ok(mailbox.pop_front())
    }

    /// Current buffer depth for `id`, or `None` if unregistered
    pub fn depth(&self, id: RobotId) -> Option<usize> {
        self.boxes.get(&id).map(|mailbox| mailbox.len())
    }

    /// The process-wide per-mailbox capacity
    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Most recent accepted delivery, for the observer
    pub fn last_delivery(&self) -> Option<&Delivery> {
        self.last_delivery.as_ref()
    }

    /// Registered robot ids, in no particular order
    pub fn registered(&self) -> impl Iterator<Item = RobotId> + '_ {
        self.boxes.keys().copied()
    }
}
