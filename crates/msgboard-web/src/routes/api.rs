//! JSON message listing.

use axum::{extract::State, http::StatusCode, Json};
use msgboard_core::Message;

use crate::routes::status_for;
use crate::state::AppState;

/// GET /messages.json - All messages, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, (StatusCode, String)> {
    let messages = state
        .messages
        .list_all()
        .await
        .map_err(|e| (status_for(&e), e.to_string()))?;

    Ok(Json(messages))
}
