//! Delivery implementations
//!
//! In-process tokio-channel delivery for single-process operation. The
//! `Delivery`/`Subscription` traits (switchboard-ports) are the seam for
//! plugging in cross-process transports later.

pub mod local;

pub use local::{DEFAULT_CAPACITY, LocalDelivery};
