//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::ws::dispatch::ClientConnection;
use crate::ws::protocol::Frame;

/// Frames buffered per connection; newer frames are dropped while it is full
const OUTBOUND_BUFFER: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);

    let mut conn = ClientConnection::new(state.rooms.clone(), tx);
    let conn_id = conn.id;
    info!(conn_id = %conn_id, "New WebSocket connection");

    // Spawn writer task: outbound queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame.to_string())).await {
                debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> dispatcher
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => conn.handle_text(&text),
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(conn_id = %conn_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(conn_id = %conn_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    if let Some((room_code, seat)) = conn.seat() {
        info!(conn_id = %conn_id, room_code, seat = %seat, "Releasing seat");
    }

    // Cleanup on disconnect: vacate the seat before tearing down the writer
    conn.disconnect();
    writer_handle.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
