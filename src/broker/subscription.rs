use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::broker::engine::Registry;
use crate::broker::message::Message;
use crate::broker::topic::SubscriberId;

/// Delivery callback invoked synchronously on the publisher's task.
pub type OnMessage = dyn Fn(&Message) + Send + Sync;

/// One registered subscriber as stored in a topic's set.
///
/// The `active` flag is cleared before the entry is removed; fan-out
/// checks it immediately before invoking the callback, so an entry an
/// in-flight publish already snapshotted is still skipped once its
/// subscription has been cancelled.
pub(crate) struct SubscriberEntry {
    pub(crate) callback: Box<OnMessage>,
    pub(crate) active: AtomicBool,
}

/// Handle to one subscriber's interest in one topic.
///
/// Returned by [`crate::broker::Broker::subscribe`] and exclusively
/// owned by the caller that created it. Dropping the handle does not
/// unsubscribe; cancellation is always explicit.
pub struct Subscription {
    pub(crate) registry: Arc<Registry>,
    pub(crate) key: String,
    pub(crate) id: SubscriberId,
    pub(crate) entry: Arc<SubscriberEntry>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// The topic key this subscription is registered under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Removes this subscription from its topic.
    ///
    /// Idempotent: only the call that flips the entry from active to
    /// inactive performs the removal, every later call is a no-op.
    /// Safe to invoke concurrently with a publish fanning out to the
    /// same key.
    pub fn unsubscribe(&self) {
        if !self.entry.active.swap(false, Ordering::AcqRel) {
            return;
        }
        self.registry.remove(&self.key, self.id);
        debug!(key = %self.key, id = self.id, "subscriber removed");
    }
}
