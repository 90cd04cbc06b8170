//! Listener adapter: unpacks inbound envelopes and injects the reply
//! capability before invoking the user handler

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use std::sync::Arc;
use switchboard_core::Envelope;
use switchboard_ports::{Delivery, Subscription};
use tokio::sync::Notify;

use crate::error::HubResult;

/// User-supplied channel handler.
///
/// Handler identity for registration purposes is the `Arc` the handler is
/// installed behind: installing the same `Arc` twice on one channel is a
/// no-op, while two separate `Arc`s wrapping equal values count as two
/// registrations.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called exactly once per inbound message on the registered channel.
    ///
    /// Errors are logged at the adapter boundary and never propagate into
    /// dispatch. Long-running work is fine; it only delays later deliveries
    /// to this same registration.
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()>;
}

/// Per-message context handed to a handler.
///
/// Carries the reply capability when the inbound envelope asked for
/// correlated replies; otherwise [`ReplyContext::reply`] is an inert no-op.
#[derive(Clone)]
pub struct ReplyContext {
    channel: String,
    reply_channel: Option<String>,
    delivery: Arc<dyn Delivery>,
}

impl ReplyContext {
    pub(crate) fn new(
        channel: String,
        reply_channel: Option<String>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            channel,
            reply_channel,
            delivery,
        }
    }

    /// Channel the inbound message arrived on
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the sender armed a reply subscription for this message
    pub fn can_reply(&self) -> bool {
        self.reply_channel.is_some()
    }

    /// Send `data` back to the requester's reply subscription.
    ///
    /// A no-op when the inbound message carried no reply channel. Delivery
    /// failures are absorbed here; a reply to a subscription that is already
    /// gone is silently dropped.
    pub async fn reply(&self, data: Value) {
        let Some(reply_channel) = &self.reply_channel else {
            debug!("reply ignored on '{}': no reply channel", self.channel);
            return;
        };
        if let Err(e) = self
            .delivery
            .transmit(Envelope::reply(reply_channel.clone(), data))
            .await
        {
            debug!("reply on '{}' dropped: {}", reply_channel, e);
        }
    }
}

/// Wraps a user handler for attachment to a channel subscription
pub(crate) struct ListenerAdapter {
    channel: String,
    handler: Arc<dyn MessageHandler>,
    delivery: Arc<dyn Delivery>,
}

impl ListenerAdapter {
    pub(crate) fn new(
        channel: String,
        handler: Arc<dyn MessageHandler>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            channel,
            handler,
            delivery,
        }
    }

    /// Invoke the user handler once for one inbound envelope
    async fn dispatch(&self, envelope: Envelope) {
        let ctx = ReplyContext::new(
            self.channel.clone(),
            envelope.reply_channel.clone(),
            self.delivery.clone(),
        );
        if let Err(e) = self.handler.on_message(ctx, envelope.payload).await {
            error!("handler on '{}' failed: {}", self.channel, e);
        }
    }

    /// Pump envelopes from `subscription` into the handler until `stop`
    /// fires or the channel closes. Stops are observed between deliveries,
    /// so an in-flight handler invocation always completes.
    pub(crate) fn spawn_pump(self, mut subscription: Box<dyn Subscription>, stop: Arc<Notify>) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    next = subscription.next() => match next {
                        Ok(envelope) => self.dispatch(envelope).await,
                        Err(_) => break,
                    },
                }
            }
            debug!("listener pump on '{}' stopped", self.channel);
        });
    }
}
