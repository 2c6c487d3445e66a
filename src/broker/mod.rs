//! The `broker` module is the pub/sub engine proper.
//!
//! It maintains the registry of topics and their active subscribers,
//! fans published messages out to every subscriber of a key, and owns
//! the subscription lifecycle: registration, idempotent removal, and
//! the drain performed at shutdown.

pub mod engine;
pub mod error;
pub mod message;
pub mod subscription;
pub mod topic;

pub use engine::Broker;
pub use error::BrokerError;
pub use message::Message;
pub use subscription::Subscription;
