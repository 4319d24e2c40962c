//! Websocket endpoints
//!
//! Each upgraded connection gets its own [`SessionRuntime`] running on the
//! connection's task. `/ws` runs the intake profile and `/check` the routine
//! checkup profile.

use super::AppState;
use crate::runtime::{SessionOutcome, SessionRuntime, Transport, TransportError};
use crate::state_machine::{SessionContext, SessionProfile};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::error::Error as StdError;
use std::io::ErrorKind;

/// Messages of the websocket errors that mean the client went away
const PEER_GONE_MESSAGES: [&str; 3] = [
    "Connection closed normally",
    "Trying to work with closed connection",
    "Connection reset without closing handshake",
];

/// Whether a receive error means the peer dropped the connection rather than
/// a fault on our side
fn peer_closed(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |&e| e.source()).any(|e| {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            );
        }
        let text = e.to_string();
        PEER_GONE_MESSAGES.iter().any(|m| text.contains(m))
    })
}

/// [`Transport`] over an upgraded axum websocket
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
    stream: SplitStream<WebSocket>,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self { sink, stream }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn receive(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                Ok(Message::Binary(bytes)) => {
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                // Ping/Pong handled by axum/tungstenite
                Ok(_) => {}
                Err(e) if peer_closed(&e) => {
                    tracing::debug!(error = %e, "Client dropped the connection");
                    return None;
                }
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

pub(super) async fn intake_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        run_session(socket, state, SessionProfile::intake()).await;
    })
}

pub(super) async fn routine_check_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        run_session(socket, state, SessionProfile::routine_check()).await;
    })
}

async fn run_session(socket: WebSocket, state: AppState, profile: SessionProfile) -> SessionOutcome {
    let session_id = uuid::Uuid::new_v4().to_string();
    let context = SessionContext::new(session_id, profile, state.exit.clone());
    SessionRuntime::new(context, state.services, WsTransport::new(socket))
        .run()
        .await
}
