use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::broker::subscription::SubscriberEntry;

pub type SubscriberId = u64;

/// A topic and its live subscriber set.
///
/// The set is guarded by its own mutex so that subscribe, unsubscribe
/// and fan-out on one key serialize against each other while leaving
/// other keys untouched. Whoever holds the lock sees the set whole,
/// never mid-mutation.
pub struct Topic {
    pub(crate) name: String,
    pub(crate) subscribers: Mutex<HashMap<SubscriberId, Arc<SubscriberEntry>>>,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Mutex::new(HashMap::new()),
        }
    }
}
