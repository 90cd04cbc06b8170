use crate::error::DeliveryResult;
use async_trait::async_trait;
use switchboard_core::Envelope;

/// Point-to-point delivery primitive supplied by the host environment.
///
/// Best-effort, in-order per sender, no acknowledgement. Transmitting on a
/// channel nobody listens to is not an error; the message is dropped at this
/// boundary. The routing core never retries.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Hand an envelope to the primitive for delivery on `envelope.channel`
    async fn transmit(&self, envelope: Envelope) -> DeliveryResult<()>;

    /// Open a subscription receiving every envelope transmitted on `channel`
    /// from this point on.
    ///
    /// Dropping the returned subscription is the unsubscribe; the primitive
    /// silently discards messages that arrive after that.
    fn subscribe(&self, channel: &str) -> Box<dyn Subscription>;
}

/// Receiving end of one channel subscription
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next envelope.
    ///
    /// Returns `DeliveryError::Closed` once the delivery primitive has shut
    /// the channel down; implementations are expected to skip (not error on)
    /// transient gaps such as backlog overruns.
    async fn next(&mut self) -> DeliveryResult<Envelope>;
}
