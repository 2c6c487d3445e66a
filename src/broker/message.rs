use serde::{Deserialize, Serialize};

/// A published message as seen by subscriber callbacks.
///
/// The payload is opaque to the broker; it is stamped with the key it
/// was published under and the publish time in milliseconds since the
/// Unix epoch. Messages are not retained after delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub key: String,
    pub payload: String,
    pub timestamp: i64,
}
