//! msgboard broadcast channel.
//!
//! Publishing goes through the [`Broadcaster`] capability so the message
//! store never reaches for a process-wide transport. Three transports ship
//! with the crate:
//!
//! - [`CableHub`]: in-process fan-out to WebSocket subscribers.
//! - [`RedisBroadcaster`]: Redis `PUBLISH`, paired with [`relay_from_redis`]
//!   on each server so several processes share one channel.
//! - [`HttpRelay`]: forwards to a running server's internal endpoint.

pub mod error;
pub mod hub;
pub mod pubsub;
pub mod relay;

pub use error::{CableError, CableResult};
pub use hub::{Broadcast, BroadcastReceiver, CableHub, DEFAULT_CAPACITY};
pub use pubsub::{init_pool, relay_from_redis, RedisBroadcaster, RedisPool};
pub use relay::{HttpRelay, DEFAULT_SERVER_URL};

use async_trait::async_trait;
use serde_json::Value;

/// Publishes payloads on named topics.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish `payload` on `topic`.
    ///
    /// Returns how many subscribers the transport reports reaching (0 when
    /// there are none or the transport cannot tell). An `Err` means the
    /// transport itself failed.
    async fn publish(&self, topic: &str, payload: &Value) -> CableResult<usize>;
}

