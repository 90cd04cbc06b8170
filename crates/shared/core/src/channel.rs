//! Channel naming
//!
//! Channels are opaque, process-wide-unique strings matched exactly; there is
//! no hierarchy or wildcard matching. This module only fixes the naming
//! scheme for derived reply channels so that:
//! - correlated replies are routable like any other message
//! - logs can fold a reply channel back to the base channel it answers

/// Marker separating a base channel from its reply-correlation suffix
pub const REPLY_INFIX: &str = ":reply:";

/// Build a reply-channel name for a correlated request.
///
/// `seq` disambiguates requests allocated within the same millisecond;
/// `timestamp_ms` guards against sequence reuse across process restarts.
pub fn reply_channel_name(base: &str, timestamp_ms: i64, seq: u64) -> String {
    format!("{base}{REPLY_INFIX}{timestamp_ms}:{seq}")
}

/// Whether a channel name was derived for reply correlation
pub fn is_reply_channel(channel: &str) -> bool {
    channel.contains(REPLY_INFIX)
}

/// Fold a reply channel back to its base channel name.
///
/// Returns the input unchanged for ordinary channels.
pub fn base_channel(channel: &str) -> &str {
    match channel.find(REPLY_INFIX) {
        Some(idx) => &channel[..idx],
        None => channel,
    }
}
