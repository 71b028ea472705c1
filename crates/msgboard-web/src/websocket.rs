//! WebSocket endpoint streaming broadcasts to viewers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink};
use msgboard_cable::BroadcastReceiver;
use msgboard_core::MESSAGE_TOPIC;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct CableQuery {
    /// Topic to follow. Defaults to the message topic.
    pub stream: Option<String>,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<CableQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let stream = query.topic();
    ws.on_upgrade(move |socket| handle_socket(socket, state, stream))
}

impl CableQuery {
    /// The requested topic, or the message topic when none was given.
    pub fn topic(self) -> String {
        self.stream.unwrap_or_else(|| MESSAGE_TOPIC.to_string())
    }
}

/// Wait for the next broadcast on `topic` and return its payload as JSON text.
///
/// Other topics are skipped. A lagging receiver loses the overwritten
/// broadcasts and carries on. Returns `None` once the hub is gone.
pub async fn next_payload(rx: &mut BroadcastReceiver, topic: &str) -> Option<String> {
    loop {
        match rx.recv().await {
            Ok(broadcast) if broadcast.topic == topic => return Some(broadcast.payload.to_string()),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "WebSocket client lagging, broadcasts dropped");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Push every payload on `topic` into `sink` until the hub or the sink closes.
pub async fn forward_broadcasts<S>(mut rx: BroadcastReceiver, topic: String, mut sink: S)
where
    S: Sink<Message> + Unpin,
{
    while let Some(json) = next_payload(&mut rx, &topic).await {
        debug!(message = %json, "Sending broadcast to WebSocket client");
        if sink.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket send failed, client disconnected");
            break;
        }
    }
}

/// Handle individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState, stream: String) {
    let (sender, mut receiver) = socket.split();
    let rx = state.hub.subscribe();

    let receiver_count = state.hub.receiver_count();
    info!(receiver_count, stream = %stream, "WebSocket client connected");

    let mut send_task = tokio::spawn(forward_broadcasts(rx, stream, sender));

    // Viewers only listen; drain until the client closes
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                debug!("WebSocket client sent close frame");
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("WebSocket client disconnected");
}
