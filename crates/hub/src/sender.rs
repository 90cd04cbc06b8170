//! Sender-side reply subscriptions and cancellation

use log::debug;
use serde_json::Value;
use std::sync::Arc;
use switchboard_ports::Subscription;
use tokio::sync::Notify;

/// Reply cardinality of an armed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Auto-deregisters the instant the first reply arrives
    OneShot,
    /// Stays active until the cancel handle fires
    Streaming,
}

/// Callback receiving reply payloads, invoked in arrival order
pub type ReplyCallback = Box<dyn FnMut(Value) + Send>;

/// Cancellation handle returned from every send mode.
///
/// [`CancelHandle::cancel`] detaches the underlying reply subscription;
/// calling it again is a no-op, as is calling it on a fire-and-forget handle
/// (there is nothing to cancel). Replies already accepted by the delivery
/// primitive when `cancel` runs are dropped at the removed subscription,
/// not queued.
#[derive(Clone)]
pub struct CancelHandle {
    stop: Option<Arc<Notify>>,
}

impl CancelHandle {
    /// Handle for a send that armed no reply subscription
    pub(crate) fn noop() -> Self {
        Self { stop: None }
    }

    pub(crate) fn armed(stop: Arc<Notify>) -> Self {
        Self { stop: Some(stop) }
    }

    /// Detach the reply subscription, if any
    pub fn cancel(&self) {
        if let Some(stop) = &self.stop {
            stop.notify_one();
        }
    }

    /// Whether this handle was armed with a reply subscription at creation
    pub fn is_armed(&self) -> bool {
        self.stop.is_some()
    }
}

/// Arm a reply subscription, pumping reply payloads into `on_reply`.
///
/// One-shot pumps drop their subscription the moment the first reply
/// arrives, before the callback runs, so the callback fires at most once
/// per request no matter how often a responder replies.
pub(crate) fn arm_reply_subscription(
    reply_channel: String,
    mut subscription: Box<dyn Subscription>,
    mode: ReplyMode,
    mut on_reply: ReplyCallback,
) -> CancelHandle {
    let stop = Arc::new(Notify::new());
    let handle = CancelHandle::armed(stop.clone());

    tokio::spawn(async move {
        match mode {
            ReplyMode::OneShot => {
                tokio::select! {
                    biased;
                    _ = stop.notified() => {}
                    first = subscription.next() => {
                        // Subscription gone before the callback observes the reply
                        drop(subscription);
                        if let Ok(envelope) = first {
                            on_reply(envelope.payload);
                        }
                    }
                }
            }
            ReplyMode::Streaming => loop {
                tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    next = subscription.next() => match next {
                        Ok(envelope) => on_reply(envelope.payload),
                        Err(_) => break,
                    },
                }
            },
        }
        debug!("reply subscription on '{}' closed", reply_channel);
    });

    handle
}
