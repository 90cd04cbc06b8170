//! Error types for the hub crate

use switchboard_ports::DeliveryError;
use thiserror::Error;

/// Errors surfaced to hub callers and returned by message handlers
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Handler error: {0}")]
    Handler(String),
}

impl HubError {
    /// Wrap an arbitrary handler failure
    pub fn handler(err: impl std::fmt::Display) -> Self {
        HubError::Handler(err.to_string())
    }
}

pub type HubResult<T> = std::result::Result<T, HubError>;
