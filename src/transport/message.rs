use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { key: String },

    #[serde(rename = "publish")]
    Publish { key: String, data: String },
}

/// Frames the server sends back.
///
/// `Event` carries a delivered message on a subscribed stream; `Ack`
/// acknowledges a successful publish; `Error` reports a failed request
/// with a coarse code and a client-safe message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "event")]
    Event {
        key: String,
        data: String,
        timestamp: i64,
    },

    #[serde(rename = "ack")]
    Ack,

    #[serde(rename = "error")]
    Error { code: ErrorCode, message: String },
}

/// Transport-level error classes.
///
/// Validation failures map to `InvalidArgument`, publishing to a key
/// nobody listens on to `NotFound`, and everything else to `Internal`
/// with the cause logged rather than leaked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
}
