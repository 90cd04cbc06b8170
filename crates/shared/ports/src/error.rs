use thiserror::Error;

/// Errors surfaced by a delivery primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Channel closed")]
    Closed,

    #[error("Transmit failed: {0}")]
    Transmit(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;
