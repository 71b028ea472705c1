//! Internal broadcast relay endpoint.
//!
//! Relayed broadcasts skip the whitelist and the store, so the endpoint
//! only answers when the server listens on a loopback address.

use axum::{extract::State, http::StatusCode, Json};
use msgboard_cable::Broadcast;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::state::AppState;

#[derive(Serialize)]
pub struct RelayAck {
    pub receivers: usize,
}

/// POST /internal/broadcast - Fan a relayed broadcast out to local subscribers.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(broadcast): Json<Broadcast>,
) -> Result<Json<RelayAck>, (StatusCode, String)> {
    if !state.internal_relay {
        warn!(topic = %broadcast.topic, "Refused relayed broadcast on non-loopback server");
        return Err((
            StatusCode::FORBIDDEN,
            "Broadcast relay is only available on loopback servers".to_string(),
        ));
    }

    info!(topic = %broadcast.topic, "Received relayed broadcast");
    let receivers = state.hub.send(broadcast);
    debug!(receivers, "Relayed broadcast delivered");
    Ok(Json(RelayAck { receivers }))
}
