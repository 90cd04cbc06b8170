//! Message envelope carried between execution contexts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Immutable message envelope routed through the hub.
///
/// `payload` is an arbitrary structured value whose semantics are opaque to
/// the routing layer. `reply_channel` is present only for correlated
/// request/reply sends; plain notifications leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique id for diagnostics and log correlation
    pub id: Uuid,
    /// Destination channel (exact-match topic name)
    pub channel: String,
    /// Opaque structured payload
    pub payload: Value,
    /// Channel the receiver should address correlated replies to
    pub reply_channel: Option<String>,
    /// Wall-clock send time
    pub sent_at: DateTime<Utc>,
}

impl Envelope {
    /// Create a fire-and-forget envelope (no reply expected)
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            payload,
            reply_channel: None,
            sent_at: Utc::now(),
        }
    }

    /// Create a request envelope carrying the channel replies should go to
    pub fn with_reply(
        channel: impl Into<String>,
        payload: Value,
        reply_channel: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            payload,
            reply_channel: Some(reply_channel.into()),
            sent_at: Utc::now(),
        }
    }

    /// Create a reply envelope addressed to a reply channel.
    ///
    /// Replies never carry a further reply channel of their own.
    pub fn reply(reply_channel: impl Into<String>, payload: Value) -> Self {
        Self::new(reply_channel, payload)
    }

    /// Whether the sender armed a reply subscription for this envelope
    pub fn expects_reply(&self) -> bool {
        self.reply_channel.is_some()
    }
}
