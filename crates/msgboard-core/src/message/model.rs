//! Message domain models.

use msgboard_db::queries::messages::MessageRow;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A persisted board message. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub created_at: String,
}

impl Message {
    /// Create from database row.
    pub fn from_row(row: MessageRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
        }
    }

    /// Payload published on the real-time channel: the content only.
    pub fn broadcast_payload(&self) -> Value {
        json!({ "data": self.content })
    }
}

/// Unsaved message used to pre-fill the submission form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageDraft {
    pub content: String,
}

impl MessageDraft {
    /// A draft carrying text the user already typed, e.g. after a rejected submit.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
