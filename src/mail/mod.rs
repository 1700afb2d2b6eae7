//! Robot mail
//!
//! Bounded per-robot mailboxes for inter-robot text payloads.
//!
//! # Overview
//!
//! Mail is the signaling layer between robot tasks:
//! - **Bounded buffers**: each robot's mailbox holds at most `buffer_limit`
//!   payloads; a full mailbox rejects new sends (flow control)
//! - **FIFO delivery**: payloads drain in the order they were accepted
//! - **Non-blocking**: send and receive return immediately; there is no
//!   notion of waiting on a mailbox
//!
//! Delivery guarantees are deliberately weak: FIFO per recipient and
//! nothing more.

mod mailbox;

pub use mailbox::{Delivery, MailboxRegistry, SendOutcome};
