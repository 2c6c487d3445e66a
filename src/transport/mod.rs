//! The `transport` module is the service gateway between the network
//! and the broker.
//!
//! It defines the JSON frame protocol spoken over WebSockets, runs the
//! accept loop, and bridges each connection to the broker: a subscribe
//! frame becomes a broker subscription whose callback streams events
//! back onto the socket, a publish frame becomes a broker publish whose
//! outcome is acknowledged or mapped to a wire error code.

pub mod message;
pub mod websocket;
