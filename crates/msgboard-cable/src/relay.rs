//! HTTP relay to a running msgboard server.
//!
//! Processes that write to the database without hosting the WebSocket
//! endpoint (the CLI, for instance) use this to hand the broadcast to the
//! server, which fans it out to its subscribers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::{Broadcaster, CableError, CableResult};

/// Default server URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3030";

#[derive(Deserialize)]
struct RelayAck {
    receivers: usize,
}

/// Forwards broadcasts to `<base_url>/internal/broadcast`.
#[derive(Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRelay {
    /// Create a relay targeting `base_url`.
    pub fn with_url(base_url: &str) -> Self {
        debug!(base_url = %base_url, "HttpRelay initialized");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HttpRelay {
    fn default() -> Self {
        Self::with_url(DEFAULT_SERVER_URL)
    }
}

#[async_trait]
impl Broadcaster for HttpRelay {
    async fn publish(&self, topic: &str, payload: &Value) -> CableResult<usize> {
        let url = format!("{}/internal/broadcast", self.base_url);
        let body = json!({ "topic": topic, "payload": payload });

        debug!(url = %url, topic, "Relaying broadcast");

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(CableError::Rejected(response.status().as_u16()));
        }

        let ack: RelayAck = response.json().await?;
        Ok(ack.receivers)
    }
}
