//! HTTP and WebSocket handlers for the signaling relay
//!
//! Each upgraded socket gets a reader loop that feeds frames to the router in
//! arrival order, and a writer task that drains the connection's outbound
//! queue onto the socket.

use crate::connection::Connection;
use crate::error::SignalingError;
use crate::protocol::ServerMessage;
use crate::router::SignalingRouter;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long the writer gets to flush and send a Close frame after the reader stops
const CLOSE_GRACE: Duration = Duration::from_secs(2);

const BANNER: &str = "Signal Relay\n\
    \n\
    Endpoints:\n\
    - GET /health - Health check\n\
    - GET /ws - WebSocket signaling channel\n\
    \n\
    Requests (JSON text frames):\n\
    - {\"type\": \"login\", \"name\": ...}\n\
    - {\"type\": \"offer\", \"name\": ..., \"offer\": ...}\n\
    - {\"type\": \"answer\", \"name\": ..., \"answer\": ...}\n\
    - {\"type\": \"candidate\", \"name\": ..., \"candidate\": ...}\n\
    - {\"type\": \"leave\", \"name\": ...}\n";

/// Shared state for the HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub router: SignalingRouter,
    pub max_message_bytes: usize,
    pub outbox_capacity: usize,
}

/// Build the HTTP router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ws", get(websocket_handler))
        .fallback(not_found)
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SignalingError> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn index() -> &'static str {
    BANNER
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn websocket_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state.router, state.outbox_capacity))
}

/// Run one client connection to completion
pub async fn handle_socket(socket: WebSocket, router: SignalingRouter, outbox_capacity: usize) {
    let (sink, mut stream) = socket.split();
    let (connection, outbox) = Connection::with_capacity(outbox_capacity);
    let connection_id = connection.id();
    let mut writer = tokio::spawn(write_outbox(sink, outbox));

    let mut session = router.connect(connection);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                router.handle_message(&mut session, text.as_str().as_bytes())
            }
            Ok(Message::Binary(bytes)) => router.handle_message(&mut session, &bytes),
            Ok(Message::Close(_)) => break,
            // Pings are answered by the transport
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, %err, "WebSocket error");
                break;
            }
        }
    }

    // Dropping the session releases the last long-lived sender, so the writer
    // drains what is queued, sends Close and exits.
    router.disconnect(session);
    if timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        debug!(connection = %connection_id, "Writer did not finish, aborting");
        writer.abort();
    }
    debug!(connection = %connection_id, "Connection closed");
}

async fn write_outbox(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<ServerMessage>,
) {
    while let Some(message) = outbox.recv().await {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "Failed to encode message");
                continue;
            }
        };
        if let Err(err) = sink.send(Message::Text(text.into())).await {
            info!(%err, "Failed to send message, closing writer");
            return;
        }
    }
    // Sends our Close frame, or flushes the reply to the client's Close
    if let Err(err) = sink.close().await {
        debug!(%err, "Close handshake failed");
    }
}

