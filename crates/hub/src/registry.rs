//! Registration table for installed channel handlers
//!
//! Maps `(channel, handler identity)` to the guard owning that handler's
//! listener pump. The table is the single source of truth for
//! un-registration: install is idempotent, removal is handler-scoped, and
//! both report their outcome as a bool rather than an error.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::listener::MessageHandler;

/// Identity of a user handler: the address of the `Arc` allocation it was
/// installed behind. Reference equality, not value equality.
pub(crate) type HandlerKey = usize;

pub(crate) fn handler_key(handler: &Arc<dyn MessageHandler>) -> HandlerKey {
    Arc::as_ptr(handler) as *const () as usize
}

/// Owns one installed listener pump; dropping the guard stops the pump
/// cooperatively (the in-flight handler invocation, if any, completes).
#[derive(Debug)]
pub(crate) struct SubscriptionGuard {
    stop: Arc<Notify>,
}

impl SubscriptionGuard {
    pub(crate) fn new(stop: Arc<Notify>) -> Self {
        Self { stop }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.stop.notify_one();
    }
}

pub(crate) struct RegistrationTable {
    entries: DashMap<(String, HandlerKey), SubscriptionGuard>,
}

impl RegistrationTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Install under `(channel, key)` unless that exact pair is already
    /// present. `make_guard` runs only when the slot is vacant.
    pub(crate) fn install_with(
        &self,
        channel: &str,
        key: HandlerKey,
        make_guard: impl FnOnce() -> SubscriptionGuard,
    ) -> bool {
        match self.entries.entry((channel.to_string(), key)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(make_guard());
                true
            }
        }
    }

    /// Remove the registration for `(channel, key)`. Returns `false` when
    /// the pair was never installed; there is no channel-wide fallback.
    pub(crate) fn remove(&self, channel: &str, key: HandlerKey) -> bool {
        self.entries.remove(&(channel.to_string(), key)).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
