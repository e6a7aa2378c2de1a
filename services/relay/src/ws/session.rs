//! Manages the WebSocket connection lifecycle for one call.
//!
//! One connection carries exactly one call. Three tasks cooperate per
//! connection: the reader (this function's tail) parses frames into typed
//! events and queues them in arrival order; a dispatcher task consumes the
//! queue serially; a writer task owns the sink so the call has a single
//! outbound writer. The reader stays responsive while a reply streams, so
//! an interrupt can be queued mid-reply.

use super::{
    dispatch::run_dispatcher,
    protocol::{InboundMessage, OutboundMessage},
};
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, instrument, warn};

const EVENT_QUEUE_DEPTH: usize = 32;
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual relay connection.
#[instrument(name = "relay_session", skip_all, fields(conn_id, call_sid))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id: u32 = rand::random();
    tracing::Span::current().record("conn_id", conn_id);
    info!("New relay connection. Awaiting setup...");

    let (socket_tx, mut socket_rx) = socket.split();

    let (out_tx, out_rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_DEPTH);
    let writer = tokio::spawn(write_outbound(socket_tx, out_rx).in_current_span());

    // Uninitialized until a `setup` event binds the call SID.
    let Some(call_sid) = await_setup(&mut socket_rx).await else {
        info!("Connection closed before setup");
        drop(out_tx);
        let _ = writer.await;
        return;
    };
    tracing::Span::current().record("call_sid", call_sid.as_str());
    info!("Setup received; session active");
    state.sessions.create(&call_sid);

    let (event_tx, event_rx) = mpsc::channel::<InboundMessage>(EVENT_QUEUE_DEPTH);
    let dispatcher = tokio::spawn(
        run_dispatcher(state.clone(), call_sid.clone(), event_rx, out_tx).in_current_span(),
    );

    read_inbound(&mut socket_rx, &event_tx).await;

    // Channel closed: let the dispatcher drain its queue, then tear the
    // session down.
    drop(event_tx);
    if let Err(e) = dispatcher.await {
        error!(error = ?e, "dispatcher task failed");
    }
    state.sessions.remove(&call_sid);
    let _ = writer.await;
    info!("Relay connection closed and session removed");
}

/// Waits for the `setup` event that binds this channel to a call.
///
/// Events arriving before setup are protocol violations: reported and
/// dropped, with the connection kept open. Returns `None` when the channel
/// closes first.
async fn await_setup(socket_rx: &mut SplitStream<WebSocket>) -> Option<String> {
    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(InboundMessage::Setup { call_sid }) => return Some(call_sid),
                Ok(event) => {
                    warn!(event = ?event, "event before setup; dropping");
                }
                Err(e) => {
                    warn!(error = %e, "malformed message before setup; dropping");
                }
            },
            Ok(Message::Close(_)) => return None,
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "error receiving from relay");
                return None;
            }
        }
    }
    None
}

/// Parses inbound frames and queues them for the dispatcher, in arrival
/// order, until the channel closes. A malformed frame is dropped without
/// affecting the session.
async fn read_inbound(
    socket_rx: &mut SplitStream<WebSocket>,
    event_tx: &mpsc::Sender<InboundMessage>,
) {
    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(event) => {
                    if event_tx.send(event).await.is_err() {
                        error!("dispatcher gone; closing connection");
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "malformed message; dropping");
                }
            },
            Ok(Message::Close(_)) => {
                info!("Relay sent close frame");
                return;
            }
            Ok(Message::Binary(_)) => {
                warn!("unexpected binary frame; dropping");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!(error = %e, "error receiving from relay");
                return;
            }
        }
    }
}

/// Serializes and sends every outbound message for this call. Owning the
/// sink here keeps the call single-writer.
async fn write_outbound(
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<OutboundMessage>,
) {
    while let Some(msg) = out_rx.recv().await {
        match serde_json::to_string(&msg) {
            Ok(serialized) => {
                if let Err(e) = socket_tx.send(Message::Text(serialized.into())).await {
                    warn!(error = %e, "failed to send outbound message; stopping writer");
                    return;
                }
            }
            Err(e) => error!(error = %e, "failed to serialize outbound message"),
        }
    }
}
