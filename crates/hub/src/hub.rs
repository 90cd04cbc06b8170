//! Hub facade: registration, correlated request/reply, and routing

use log::debug;
use serde_json::Value;
use std::sync::Arc;
use switchboard_core::Envelope;
use switchboard_ports::Delivery;
use tokio::sync::Notify;

use crate::correlation::ReplyChannelAllocator;
use crate::error::HubResult;
use crate::listener::{ListenerAdapter, MessageHandler};
use crate::registry::{RegistrationTable, SubscriptionGuard, handler_key};
use crate::sender::{CancelHandle, ReplyCallback, ReplyMode, arm_reply_subscription};
use crate::transport::LocalDelivery;

/// Central router for hub-addressed messaging.
///
/// Senders transmit through the hub without knowing which receivers (if
/// any) are listening; receivers register handlers per channel. Correlated
/// request/reply rides on derived reply channels that only the requesting
/// sender subscribes to.
///
/// The hub does not implement request timeouts. A caller needing a bounded
/// wait composes its own timer around the returned [`CancelHandle`]:
///
/// ```rust,ignore
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// let handle = hub.request("status.ping", payload, move |r| { let _ = tx.send(r); }).await?;
/// if tokio::time::timeout(wait, rx.recv()).await.is_err() {
///     handle.cancel();
/// }
/// ```
pub struct Hub {
    delivery: Arc<dyn Delivery>,
    registry: RegistrationTable,
    allocator: ReplyChannelAllocator,
}

impl Hub {
    /// Create a hub over the given delivery primitive
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self {
            delivery,
            registry: RegistrationTable::new(),
            allocator: ReplyChannelAllocator::new(),
        }
    }

    /// Create a hub over an in-process delivery with default capacity
    pub fn in_process() -> Self {
        Self::new(Arc::new(LocalDelivery::default()))
    }

    /// The delivery primitive this hub routes through
    pub fn delivery(&self) -> Arc<dyn Delivery> {
        self.delivery.clone()
    }

    /// Fire-and-forget send.
    ///
    /// Succeeds once the delivery primitive accepts the message, whether or
    /// not anyone is listening. The returned handle is a permanent no-op,
    /// kept for interface uniformity with the request modes.
    pub async fn send(&self, channel: &str, payload: Value) -> HubResult<CancelHandle> {
        debug!("send on '{}'", channel);
        self.delivery.transmit(Envelope::new(channel, payload)).await?;
        Ok(CancelHandle::noop())
    }

    /// One-shot request: `on_reply` fires at most once, with the first reply.
    ///
    /// The reply subscription self-cancels the instant the first reply
    /// arrives; if no handler ever replies, the callback simply never fires.
    pub async fn request(
        &self,
        channel: &str,
        payload: Value,
        on_reply: impl FnMut(Value) + Send + 'static,
    ) -> HubResult<CancelHandle> {
        self.request_with(channel, payload, ReplyMode::OneShot, Box::new(on_reply))
            .await
    }

    /// Streaming request: `on_reply` fires once per reply, in send order,
    /// until the returned handle is cancelled.
    pub async fn request_stream(
        &self,
        channel: &str,
        payload: Value,
        on_reply: impl FnMut(Value) + Send + 'static,
    ) -> HubResult<CancelHandle> {
        self.request_with(channel, payload, ReplyMode::Streaming, Box::new(on_reply))
            .await
    }

    async fn request_with(
        &self,
        channel: &str,
        payload: Value,
        mode: ReplyMode,
        on_reply: ReplyCallback,
    ) -> HubResult<CancelHandle> {
        let reply_channel = self.allocator.next(channel);
        // Arm the reply subscription before the request is visible to anyone
        let subscription = self.delivery.subscribe(&reply_channel);
        let handle = arm_reply_subscription(reply_channel.clone(), subscription, mode, on_reply);
        debug!(
            "request on '{}' expecting replies on '{}'",
            channel, reply_channel
        );
        let envelope = Envelope::with_reply(channel, payload, reply_channel);
        if let Err(e) = self.delivery.transmit(envelope).await {
            handle.cancel();
            return Err(e.into());
        }
        Ok(handle)
    }

    /// Install `handler` on `channel`.
    ///
    /// Idempotent: returns `false` (and does nothing) when this exact
    /// handler is already installed on this channel. Handler identity is
    /// the `Arc` allocation, not the value behind it.
    pub fn on(&self, channel: &str, handler: Arc<dyn MessageHandler>) -> bool {
        let key = handler_key(&handler);
        let installed = self.registry.install_with(channel, key, || {
            let stop = Arc::new(Notify::new());
            let adapter =
                ListenerAdapter::new(channel.to_string(), handler.clone(), self.delivery.clone());
            adapter.spawn_pump(self.delivery.subscribe(channel), stop.clone());
            SubscriptionGuard::new(stop)
        });
        if installed {
            debug!("handler installed on '{}'", channel);
        }
        installed
    }

    /// Remove `handler` from `channel`.
    ///
    /// Returns `false` when this exact handler is not installed there.
    /// Removal is always handler-scoped, never channel-wide.
    pub fn off(&self, channel: &str, handler: &Arc<dyn MessageHandler>) -> bool {
        let removed = self.registry.remove(channel, handler_key(handler));
        if removed {
            debug!("handler removed from '{}'", channel);
        }
        removed
    }

    /// Number of live registrations (diagnostics)
    pub fn registration_count(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::listener::ReplyContext;

    struct Silent;

    #[async_trait]
    impl MessageHandler for Silent {
        async fn on_message(&self, _ctx: ReplyContext, _payload: Value) -> HubResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_install_is_idempotent_per_arc() {
        let hub = Hub::in_process();
        let handler: Arc<dyn MessageHandler> = Arc::new(Silent);

        assert!(hub.on("ping", handler.clone()));
        assert!(!hub.on("ping", handler.clone()));
        assert_eq!(hub.registration_count(), 1);
    }

    #[tokio::test]
    async fn test_separate_arcs_are_separate_registrations() {
        let hub = Hub::in_process();
        let first: Arc<dyn MessageHandler> = Arc::new(Silent);
        let second: Arc<dyn MessageHandler> = Arc::new(Silent);

        assert!(hub.on("ping", first.clone()));
        assert!(hub.on("ping", second.clone()));
        assert_eq!(hub.registration_count(), 2);
    }

    #[tokio::test]
    async fn test_removal_is_symmetric() {
        let hub = Hub::in_process();
        let handler: Arc<dyn MessageHandler> = Arc::new(Silent);

        hub.on("ping", handler.clone());
        assert!(hub.off("ping", &handler));
        assert!(!hub.off("ping", &handler));
        assert_eq!(hub.registration_count(), 0);
    }

    #[tokio::test]
    async fn test_removal_is_channel_scoped() {
        let hub = Hub::in_process();
        let handler: Arc<dyn MessageHandler> = Arc::new(Silent);

        hub.on("ping", handler.clone());
        assert!(!hub.off("pong", &handler));
        assert_eq!(hub.registration_count(), 1);
    }

    #[tokio::test]
    async fn test_send_without_listeners_succeeds() {
        let hub = Hub::in_process();
        let handle = hub.send("nobody", json!({ "x": 1 })).await.unwrap();
        assert!(!handle.is_armed());
    }
}
