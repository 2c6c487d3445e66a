use thiserror::Error;

/// Errors reported by [`crate::broker::Broker`] operations.
///
/// `TopicNotFound` is an expected outcome of publishing to a key nobody
/// currently listens on; the transport maps it to its own "not found"
/// code so clients can tell it apart from infrastructure failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("key is required")]
    InvalidKey,

    #[error("topic not found")]
    TopicNotFound,

    #[error("broker is shut down")]
    Closed,

    #[error("shutdown deadline elapsed with deliveries still in flight")]
    ShutdownTimeout,
}
