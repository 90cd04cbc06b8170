//! Reply-channel allocation for correlated requests

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use switchboard_core::channel::reply_channel_name;

/// Allocates reply-channel names unique among concurrently outstanding
/// requests within one process lifetime.
///
/// The sequence number alone guarantees intra-process uniqueness; the
/// wall-clock millisecond stamp defends against sequence reuse across
/// restarts. On (practically unreachable) exhaustion the sequence wraps.
#[derive(Debug)]
pub struct ReplyChannelAllocator {
    sequence: AtomicU64,
}

impl ReplyChannelAllocator {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    /// Derive the next reply channel for a request on `base`
    pub fn next(&self, base: &str) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        reply_channel_name(base, Utc::now().timestamp_millis(), seq)
    }
}

impl Default for ReplyChannelAllocator {
    fn default() -> Self {
        Self::new()
    }
}
