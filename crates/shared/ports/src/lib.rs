//! Switchboard Ports
//!
//! Port definitions (traits) for the switchboard messaging layer.
//! These define the boundary between the routing core and whatever
//! point-to-point delivery primitive the host environment supplies.

mod delivery;
mod error;

pub use delivery::{Delivery, Subscription};
pub use error::{DeliveryError, DeliveryResult};
