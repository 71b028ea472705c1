//! Board page and message submission.

use askama::Template;
use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse, Response},
};
use msgboard_core::{permit_message_params, BoardError, Message, MessageDraft};
use tracing::{error, warn};

use crate::params::SubmittedParams;
use crate::routes::status_for;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    draft: MessageDraft,
    messages: Vec<Message>,
    error: Option<String>,
}

/// Render the board page with `status`.
async fn render_board(
    state: &AppState,
    status: StatusCode,
    draft: MessageDraft,
    error: Option<String>,
) -> Response {
    let messages = match state.messages.list_all().await {
        Ok(messages) => messages,
        Err(e) => {
            error!(error = %e, "Failed to list messages");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Error: {}", e))).into_response();
        }
    };

    let template = IndexTemplate {
        draft,
        messages,
        error,
    };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("Template error: {}", e)),
        )
            .into_response(),
    }
}

/// GET / - Submission form plus every message, newest first.
pub async fn index(State(state): State<AppState>) -> Response {
    let draft = state.messages.draft();
    render_board(&state, StatusCode::OK, draft, None).await
}

/// POST /message - Create a message and go back to the board.
pub async fn create_message(
    State(state): State<AppState>,
    SubmittedParams(params): SubmittedParams,
) -> Response {
    let params = match permit_message_params(&params) {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "Rejected message submission");
            return (status_for(&e), e.to_string()).into_response();
        }
    };

    match state.messages.create(&params.message).await {
        Ok(_) => found("/"),
        Err(BoardError::ValidationError(reason)) => {
            render_board(
                &state,
                StatusCode::UNPROCESSABLE_ENTITY,
                MessageDraft::with_content(params.message),
                Some(reason),
            )
            .await
        }
        Err(e) => {
            error!(error = %e, "Failed to create message");
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// `302 Found` to `location`.
fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}
