use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::broker::error::BrokerError;
use crate::broker::message::Message;
use crate::broker::subscription::{SubscriberEntry, Subscription};
use crate::broker::topic::{SubscriberId, Topic};

/// Shared registry behind the broker and every subscription handle.
///
/// Lock order is always the topic map first, then a topic's subscriber
/// mutex. The map lock is only ever held briefly; fan-out happens under
/// the topic mutex alone, so publishes to distinct keys run in parallel
/// while a single key's publishes stay FIFO.
pub(crate) struct Registry {
    topics: RwLock<HashMap<String, Arc<Topic>>>,
    closed: AtomicBool,
    in_flight: Mutex<usize>,
    drained: Condvar,
}

impl Registry {
    /// Removes a subscriber from its topic, dropping the topic itself
    /// once its set empties. The emptiness re-check under the map write
    /// lock covers a subscribe racing in between.
    pub(crate) fn remove(&self, key: &str, id: SubscriberId) {
        let topic = {
            let topics = self.topics.read().unwrap();
            match topics.get(key) {
                Some(t) => Arc::clone(t),
                None => return,
            }
        };
        let emptied = {
            let mut subs = topic.subscribers.lock().unwrap();
            subs.remove(&id);
            subs.is_empty()
        };
        if emptied {
            let mut topics = self.topics.write().unwrap();
            let still_empty = topics
                .get(key)
                .is_some_and(|t| t.subscribers.lock().unwrap().is_empty());
            if still_empty {
                topics.remove(key);
                debug!(key, "topic removed, last subscriber left");
            }
        }
    }

    fn begin_delivery(&self) {
        *self.in_flight.lock().unwrap() += 1;
    }

    fn end_delivery(&self) {
        let mut n = self.in_flight.lock().unwrap();
        *n -= 1;
        if *n == 0 {
            self.drained.notify_all();
        }
    }
}

/// In-memory topic pub/sub engine.
///
/// Topics exist implicitly: created on first subscribe, removed when
/// the last subscriber leaves. Publishing to a key with no active
/// subscribers reports [`BrokerError::TopicNotFound`] whether the key
/// was never subscribed to or was just abandoned; the broker does not
/// distinguish the two.
pub struct Broker {
    registry: Arc<Registry>,
    next_id: AtomicU64,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                topics: RwLock::new(HashMap::new()),
                closed: AtomicBool::new(false),
                in_flight: Mutex::new(0),
                drained: Condvar::new(),
            }),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `on_message` as a subscriber of `key`.
    ///
    /// The callback runs synchronously on whichever task publishes, so
    /// it must not block; push onto a channel and return. The returned
    /// handle is the only way to cancel the subscription.
    pub fn subscribe<F>(&self, key: &str, on_message: F) -> Result<Subscription, BrokerError>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        if key.is_empty() {
            return Err(BrokerError::InvalidKey);
        }
        if self.registry.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(SubscriberEntry {
            callback: Box::new(on_message),
            active: AtomicBool::new(true),
        });
        {
            let mut topics = self.registry.topics.write().unwrap();
            let topic = topics
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Topic::new(key)));
            topic.subscribers.lock().unwrap().insert(id, Arc::clone(&entry));
        }
        debug!(key, id, "subscriber registered");

        Ok(Subscription {
            registry: Arc::clone(&self.registry),
            key: key.to_string(),
            id,
            entry,
        })
    }

    /// Delivers `payload` to every subscriber currently active on `key`.
    ///
    /// Fan-out runs under the topic's lock: subscribers registered at
    /// the moment the publish begins are visited exactly once, in an
    /// unspecified order, and an unsubscribe racing with the publish
    /// either happens before the snapshot or after the whole fan-out.
    /// A panicking callback is caught and logged; the remaining
    /// subscribers still receive the message and the publish succeeds.
    pub fn publish(&self, key: &str, payload: &str) -> Result<(), BrokerError> {
        if key.is_empty() {
            return Err(BrokerError::InvalidKey);
        }
        if self.registry.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Closed);
        }

        self.registry.begin_delivery();
        let result = self.fan_out(key, payload);
        self.registry.end_delivery();
        result
    }

    fn fan_out(&self, key: &str, payload: &str) -> Result<(), BrokerError> {
        let topic = {
            let topics = self.registry.topics.read().unwrap();
            topics.get(key).cloned()
        };
        let Some(topic) = topic else {
            return Err(BrokerError::TopicNotFound);
        };

        let msg = Message {
            key: key.to_string(),
            payload: payload.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let subs = topic.subscribers.lock().unwrap();
        if subs.is_empty() {
            // Raced with the last unsubscribe; the topic is on its way
            // out of the map.
            return Err(BrokerError::TopicNotFound);
        }
        for (id, entry) in subs.iter() {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(&msg))).is_err() {
                warn!(key = %topic.name, id, "subscriber callback panicked, skipping");
            }
        }
        Ok(())
    }

    /// Stops accepting new subscribes and publishes, then waits up to
    /// `deadline` for in-flight deliveries to settle.
    ///
    /// Returns [`BrokerError::ShutdownTimeout`] if deliveries are still
    /// running when the deadline elapses; the caller is expected to
    /// force an abrupt stop in that case.
    pub fn shutdown(&self, deadline: Duration) -> Result<(), BrokerError> {
        self.registry.closed.store(true, Ordering::Release);

        let start = Instant::now();
        let mut in_flight = self.registry.in_flight.lock().unwrap();
        while *in_flight > 0 {
            let Some(remaining) = deadline.checked_sub(start.elapsed()) else {
                return Err(BrokerError::ShutdownTimeout);
            };
            let (guard, timeout) = self
                .registry
                .drained
                .wait_timeout(in_flight, remaining)
                .unwrap();
            in_flight = guard;
            if timeout.timed_out() && *in_flight > 0 {
                return Err(BrokerError::ShutdownTimeout);
            }
        }
        Ok(())
    }
}
