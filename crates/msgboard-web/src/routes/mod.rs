//! Route handlers.

pub mod api;
pub mod home;
pub mod internal;

use axum::http::StatusCode;
use msgboard_core::BoardError;

/// HTTP status for a failed board operation.
pub fn status_for(err: &BoardError) -> StatusCode {
    match err {
        BoardError::ParameterError(_) => StatusCode::BAD_REQUEST,
        BoardError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BoardError::MessageNotFound(_) => StatusCode::NOT_FOUND,
        BoardError::Broadcast(_)
        | BoardError::Database(_)
        | BoardError::Io(_)
        | BoardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
