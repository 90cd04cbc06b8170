//! Switchboard Hub
//!
//! Hub-routed asynchronous messaging between independent execution contexts.
//! Senders transmit named messages through a central router without knowing
//! which receivers (if any) are listening; receivers install handlers per
//! channel; correlated request/reply - one-shot or streaming - rides on
//! derived reply channels that only the requesting sender subscribes to.
//!
//! ## Architecture
//!
//! ```text
//! Sender ──transmit──► Delivery (per-channel fan-out) ──► ListenerAdapter ──► handler
//!    ▲                                                          │
//!    └───────── reply channel (requester only) ◄── ctx.reply(data)
//! ```
//!
//! The delivery primitive is injected at construction ([`Hub::new`]);
//! [`transport::LocalDelivery`] is the in-process implementation over tokio
//! broadcast channels, which [`Hub::in_process`] wires up for you.

pub mod correlation;
pub mod error;
pub mod hub;
pub mod listener;
mod registry;
pub mod sender;
pub mod transport;

// Re-export commonly used types
pub use correlation::ReplyChannelAllocator;
pub use error::{HubError, HubResult};
pub use hub::Hub;
pub use listener::{MessageHandler, ReplyContext};
pub use sender::{CancelHandle, ReplyMode};
pub use transport::LocalDelivery;

// Boundary types, so hub users need only this crate
pub use switchboard_core::Envelope;
pub use switchboard_ports::{Delivery, DeliveryError, DeliveryResult, Subscription};
