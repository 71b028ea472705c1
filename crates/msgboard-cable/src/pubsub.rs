//! Redis pub/sub transport.
//!
//! `RedisBroadcaster` publishes; `relay_from_redis` runs inside each web
//! server and feeds what it hears into the local [`CableHub`].

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::hub::{Broadcast, CableHub};
use crate::{Broadcaster, CableError, CableResult};

/// Redis connection pool. `ConnectionManager` multiplexes and reconnects
/// internally; clone it to get a handle for each operation.
pub type RedisPool = ConnectionManager;

/// Initialize a Redis connection pool from a URL.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_pool(redis_url: &str) -> CableResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}

/// Default bound on a single `PUBLISH` round trip.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

/// Publishes broadcasts with Redis `PUBLISH`.
#[derive(Clone)]
pub struct RedisBroadcaster {
    pool: RedisPool,
    timeout: Duration,
}

impl RedisBroadcaster {
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            timeout: PUBLISH_TIMEOUT,
        }
    }

    /// Connect to `redis_url` and build a broadcaster on top of it.
    pub async fn connect(redis_url: &str) -> CableResult<Self> {
        Ok(Self::new(init_pool(redis_url).await?))
    }
}

#[async_trait]
impl Broadcaster for RedisBroadcaster {
    async fn publish(&self, topic: &str, payload: &Value) -> CableResult<usize> {
        let json = serde_json::to_string(payload)?;
        let mut conn = self.pool.clone();
        let receivers: usize = tokio::time::timeout(self.timeout, conn.publish(topic, json))
            .await
            .map_err(|_| CableError::Timeout(self.timeout))??;
        debug!(topic, receivers, "Published to Redis");
        Ok(receivers)
    }
}

/// Subscribe to `topics` on Redis and re-publish every message into `hub`.
///
/// Runs until the subscription stream ends. Payloads that are not valid
/// JSON are skipped with a warning.
pub async fn relay_from_redis(redis_url: &str, topics: &[String], hub: CableHub) -> CableResult<()> {
    let client = redis::Client::open(redis_url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    for topic in topics {
        pubsub.subscribe(topic).await?;
    }
    info!(?topics, "Relaying Redis broadcasts to local subscribers");

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let topic = msg.get_channel_name().to_string();
        let raw: String = match msg.get_payload() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Unreadable Redis payload");
                continue;
            }
        };
        let payload: Value = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Dropping non-JSON Redis payload");
                continue;
            }
        };
        let receivers = hub.send(Broadcast { topic, payload });
        debug!(receivers, "Relayed Redis broadcast");
    }

    warn!("Redis subscription stream ended");
    Ok(())
}
