//! In-process delivery over tokio broadcast channels
//!
//! One broadcast channel per logical channel name gives pub/sub fan-out
//! within a single process. No serialization overhead - envelopes are passed
//! directly.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use switchboard_core::Envelope;
use switchboard_ports::{Delivery, DeliveryError, DeliveryResult, Subscription};
use tokio::sync::broadcast;

/// Default per-channel backlog capacity
pub const DEFAULT_CAPACITY: usize = 1000;

/// In-process [`Delivery`] implementation.
///
/// Every live subscription on a channel receives every envelope transmitted
/// on it, in send order. A transmit with no listeners is a dead letter:
/// dropped silently (debug-logged) and the idle channel entry pruned.
pub struct LocalDelivery {
    channels: DashMap<String, broadcast::Sender<Envelope>>,
    capacity: usize,
}

impl LocalDelivery {
    /// Create a delivery with the given per-channel backlog capacity
    /// (must be non-zero).
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Number of channels currently carrying at least one subscription or
    /// awaiting pruning (diagnostics).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Envelope> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalDelivery {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Delivery for LocalDelivery {
    async fn transmit(&self, envelope: Envelope) -> DeliveryResult<()> {
        let channel = envelope.channel.clone();
        let delivered = match self.channels.get(&channel) {
            Some(tx) => tx.send(envelope).unwrap_or(0),
            None => 0,
        };
        if delivered == 0 {
            debug!("dead letter on '{}': no listeners", channel);
            self.channels
                .remove_if(&channel, |_, tx| tx.receiver_count() == 0);
        } else {
            debug!("delivered on '{}' to {} listener(s)", channel, delivered);
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> Box<dyn Subscription> {
        Box::new(LocalSubscription {
            channel: channel.to_string(),
            rx: self.sender_for(channel).subscribe(),
        })
    }
}

struct LocalSubscription {
    channel: String,
    rx: broadcast::Receiver<Envelope>,
}

#[async_trait]
impl Subscription for LocalSubscription {
    async fn next(&mut self) -> DeliveryResult<Envelope> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => return Ok(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "subscription on '{}' lagged, skipped {} message(s)",
                        self.channel, skipped
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(DeliveryError::Closed),
            }
        }
    }
}
