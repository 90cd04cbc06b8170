//! Switchboard Core
//!
//! Pure message types for the switchboard messaging layer.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod channel;
pub mod envelope;

// Re-export commonly used types at crate root
pub use channel::{REPLY_INFIX, base_channel, is_reply_channel, reply_channel_name};
pub use envelope::Envelope;
