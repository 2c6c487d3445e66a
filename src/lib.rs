//! # SubPub
//!
//! `subpub` is a minimalist, in-memory publish/subscribe service. Publishers
//! send keyed messages; subscribers receive a live stream of messages for
//! the keys they registered interest in. Delivery is best-effort and
//! at-most-once: nothing is buffered, persisted, or replayed.
//!
//! ## Core Modules
//!
//! - `broker`: the pub/sub engine — topic registry, subscription lifecycle,
//!   synchronous fan-out, and the shutdown drain.
//! - `transport`: the WebSocket gateway adapting long-lived subscribe
//!   streams and publish requests to broker operations.
//! - `config`: loading and merging of server configuration.
//! - `utils`: shared plumbing such as logging setup.

pub mod broker;
pub mod config;
pub mod transport;
pub mod utils;
