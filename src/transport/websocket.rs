use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{Broker, BrokerError, Subscription};
use crate::transport::message::{ClientMessage, ErrorCode, ServerMessage};

/// Accepts connections on `listener` until the shutdown signal fires.
///
/// Each accepted socket gets its own session task holding a clone of
/// `session_done`; once this function has returned and every session
/// has ended, the receiving side of `session_done` observes closure,
/// which is the "drained" half of the shutdown race in `main`.
pub async fn serve(
    listener: TcpListener,
    broker: Arc<Broker>,
    mut shutdown: watch::Receiver<bool>,
    session_done: mpsc::Sender<()>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                debug!(peer = %peer, "connection accepted");
                let broker = Arc::clone(&broker);
                let shutdown = shutdown.clone();
                let done = session_done.clone();
                tokio::spawn(async move {
                    handle_connection(stream, broker, shutdown).await;
                    drop(done);
                });
            }
            _ = shutdown.changed() => {
                info!("server stopped accepting connections");
                return;
            }
        }
    }
}

/// Runs one connection: handshake, outbound send loop, inbound frame
/// loop, and the cleanup performed on the single exit path.
async fn handle_connection(
    stream: TcpStream,
    broker: Arc<Broker>,
    mut shutdown: watch::Receiver<bool>,
) {
    let conn_id = format!("conn-{}", uuid::Uuid::new_v4());

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(conn = %conn_id, error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Outbound frames funnel through one channel so the broker's
    // synchronous callbacks never touch the socket directly.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let send_conn = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(conn = %send_conn, error = %e, "failed to serialize frame");
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                // An async drop: the client is gone, events for it are
                // discarded, nothing propagates to publishers.
                debug!(conn = %send_conn, error = %e, "send loop closed");
                break;
            }
        }
    });

    let mut session = Session::new(broker, tx);
    loop {
        tokio::select! {
            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(msg)) if msg.is_text() => {
                        if let Ok(text) = msg.to_text() {
                            session.handle_frame(text);
                        }
                    }
                    // Ping/pong and close frames are handled by the
                    // protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn = %conn_id, error = %e, "read error");
                        break;
                    }
                    None => break,
                }
            }
            _ = shutdown.changed() => {
                debug!(conn = %conn_id, "closing for shutdown");
                break;
            }
        }
    }

    // Single exit path: every subscription this connection registered
    // is cancelled here, whatever ended the stream.
    session.close();
    send_task.abort();
    debug!(conn = %conn_id, "disconnected");
}

/// Per-connection state: the broker handle, the outbound frame channel,
/// and every subscription registered over this connection.
pub(crate) struct Session {
    broker: Arc<Broker>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    subscriptions: Vec<Subscription>,
}

impl Session {
    pub(crate) fn new(broker: Arc<Broker>, outbound: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            broker,
            outbound,
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Subscribe { key }) => self.handle_subscribe(key),
            Ok(ClientMessage::Publish { key, data }) => self.handle_publish(&key, &data),
            Err(e) => {
                // Malformed frames are dropped; the stream stays open.
                warn!(error = %e, frame = text, "invalid client frame");
            }
        }
    }

    fn handle_subscribe(&mut self, key: String) {
        if key.is_empty() {
            warn!("subscribe request without key");
            self.reply_error(ErrorCode::InvalidArgument, "key is required");
            return;
        }

        let outbound = self.outbound.clone();
        let result = self.broker.subscribe(&key, move |msg| {
            let event = ServerMessage::Event {
                key: msg.key.clone(),
                data: msg.payload.clone(),
                timestamp: msg.timestamp,
            };
            if outbound.send(event).is_err() {
                // The session is already unwinding; the event is lost
                // to this subscriber only.
                debug!(key = %msg.key, "dropping event for closed stream");
            }
        });
        match result {
            Ok(sub) => {
                debug!(key = %key, "stream subscribed");
                self.subscriptions.push(sub);
            }
            Err(e) => {
                error!(key = %key, error = %e, "subscribe error");
                self.reply_error(ErrorCode::Internal, "subscribe error");
            }
        }
    }

    fn handle_publish(&mut self, key: &str, data: &str) {
        if key.is_empty() {
            warn!("publish request without key");
            self.reply_error(ErrorCode::InvalidArgument, "key is required");
            return;
        }
        if data.is_empty() {
            warn!(key, "publish request without message");
            self.reply_error(ErrorCode::InvalidArgument, "message is required");
            return;
        }

        match self.broker.publish(key, data) {
            Ok(()) => self.reply(ServerMessage::Ack),
            Err(BrokerError::TopicNotFound) => {
                debug!(key, "publish to unknown topic");
                self.reply_error(ErrorCode::NotFound, "topic not found");
            }
            Err(e) => {
                error!(key, error = %e, "publish error");
                self.reply_error(ErrorCode::Internal, "publish error");
            }
        }
    }

    /// Cancels every subscription registered over this connection.
    pub(crate) fn close(&mut self) {
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
    }

    fn reply(&self, msg: ServerMessage) {
        let _ = self.outbound.send(msg);
    }

    fn reply_error(&self, code: ErrorCode, message: &str) {
        self.reply(ServerMessage::Error {
            code,
            message: message.to_string(),
        });
    }
}
