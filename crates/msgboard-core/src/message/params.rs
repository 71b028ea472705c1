//! Submission parameter whitelisting.
//!
//! A create request must look like `{"message": {"message": "<text>"}}`.
//! Only that one nested string is let through; every other key, at either
//! level, is dropped here and never reaches the store.

use serde_json::Value;
use tracing::debug;

use crate::error::{BoardError, BoardResult};

/// Key of the required parameter scope and of its single permitted field.
pub const PARAM_KEY: &str = "message";

/// The whitelisted subset of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParams {
    pub message: String,
}

/// Require the `message` scope and permit only its `message` field.
pub fn permit_message_params(params: &Value) -> BoardResult<MessageParams> {
    let scope = match params.get(PARAM_KEY) {
        Some(Value::Object(scope)) => scope,
        Some(Value::Null) | None => {
            return Err(BoardError::parameter(format!(
                "param is missing or the value is empty: {}",
                PARAM_KEY
            )))
        }
        Some(_) => {
            return Err(BoardError::parameter(format!(
                "param '{}' must be an object",
                PARAM_KEY
            )))
        }
    };

    if let Some(top) = params.as_object() {
        let dropped: Vec<&str> = top.keys().map(String::as_str).filter(|k| *k != PARAM_KEY).collect();
        if !dropped.is_empty() {
            debug!(?dropped, "Ignoring top-level parameters");
        }
    }
    let unpermitted: Vec<&str> = scope.keys().map(String::as_str).filter(|k| *k != PARAM_KEY).collect();
    if !unpermitted.is_empty() {
        debug!(?unpermitted, "Unpermitted parameters");
    }

    match scope.get(PARAM_KEY) {
        Some(Value::String(text)) => Ok(MessageParams {
            message: text.clone(),
        }),
        Some(Value::Null) | None => Err(BoardError::parameter(format!(
            "param is missing or the value is empty: {}[{}]",
            PARAM_KEY, PARAM_KEY
        ))),
        Some(_) => Err(BoardError::parameter(format!(
            "param '{}[{}]' must be a string",
            PARAM_KEY, PARAM_KEY
        ))),
    }
}
