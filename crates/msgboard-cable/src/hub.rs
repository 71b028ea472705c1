//! In-process broadcast hub.
//!
//! Uses a tokio broadcast channel; every WebSocket connection holds its own
//! receiver and filters on topic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{Broadcaster, CableResult};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 100;

/// A payload published on a topic.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Broadcast {
    pub topic: String,
    pub payload: Value,
}

/// Type alias for the broadcast receiver.
pub type BroadcastReceiver = broadcast::Receiver<Broadcast>;

/// Fan-out point for locally connected subscribers.
#[derive(Clone, Debug)]
pub struct CableHub {
    tx: broadcast::Sender<Broadcast>,
}

impl CableHub {
    /// Create a hub whose subscribers may lag by up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to everything published from now on.
    pub fn subscribe(&self) -> BroadcastReceiver {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Deliver a broadcast to current subscribers.
    ///
    /// Returns the number of subscribers reached. No subscribers is not an
    /// error: the event simply has nobody to go to.
    pub fn send(&self, broadcast: Broadcast) -> usize {
        match self.tx.send(broadcast) {
            Ok(n) => n,
            Err(_) => 0,
        }
    }
}

impl Default for CableHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Broadcaster for CableHub {
    async fn publish(&self, topic: &str, payload: &Value) -> CableResult<usize> {
        let receivers = self.send(Broadcast {
            topic: topic.to_string(),
            payload: payload.clone(),
        });
        debug!(topic, receivers, "Published to local hub");
        Ok(receivers)
    }
}
