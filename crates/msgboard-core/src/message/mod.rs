//! Message creation and listing.
//!
//! Saving a message publishes it on [`MESSAGE_TOPIC`] before the write is
//! committed. With [`BroadcastFailurePolicy::Propagate`] a failed publish
//! rolls the insert back, so a broadcast outage makes creates fail. That
//! coupling is the default; [`BroadcastFailurePolicy::Log`] keeps the row and
//! only logs the failure.

pub mod model;
pub mod params;

use chrono::{SecondsFormat, Utc};
use msgboard_cable::Broadcaster;
use msgboard_db::queries::messages as queries;
use msgboard_db::{DbPool, WriteTxn};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{BroadcastFailurePolicy, Config};
use crate::error::{BoardError, BoardResult};
use model::{Message, MessageDraft};

/// Channel every saved message is published on.
pub const MESSAGE_TOPIC: &str = "message";

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 1000;

/// The message store plus its after-save broadcast.
#[derive(Clone)]
pub struct MessageService {
    pool: DbPool,
    broadcaster: Arc<dyn Broadcaster>,
    policy: BroadcastFailurePolicy,
    max_length: usize,
}

impl MessageService {
    pub fn new(pool: DbPool, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            pool,
            broadcaster,
            policy: BroadcastFailurePolicy::default(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Build a service with the policy and limits from `config`.
    pub fn from_config(pool: DbPool, broadcaster: Arc<dyn Broadcaster>, config: &Config) -> Self {
        Self::new(pool, broadcaster)
            .with_policy(config.broadcast_failure)
            .with_max_length(config.max_length)
    }

    pub fn with_policy(mut self, policy: BroadcastFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn policy(&self) -> BroadcastFailurePolicy {
        self.policy
    }

    /// An empty, unsaved message for the submission form.
    pub fn draft(&self) -> MessageDraft {
        MessageDraft::default()
    }

    /// Persist a new message and publish it.
    pub async fn create(&self, content: &str) -> BoardResult<Message> {
        self.validate(content)?;

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let txn = self.pool.begin().await?;
        let row = queries::insert_message(&txn, &id, content, &created_at)?;
        let message = Message::from_row(row);

        self.after_save(txn, message).await
    }

    /// Publish the freshly inserted message, then settle the transaction.
    async fn after_save(&self, txn: WriteTxn, message: Message) -> BoardResult<Message> {
        let payload = message.broadcast_payload();

        match self.broadcaster.publish(MESSAGE_TOPIC, &payload).await {
            Ok(receivers) => {
                txn.commit()?;
                info!(id = %message.id, receivers, "Message created");
                Ok(message)
            }
            Err(e) => match self.policy {
                BroadcastFailurePolicy::Propagate => {
                    warn!(id = %message.id, error = %e, "Broadcast failed, message not saved");
                    // Dropping the transaction rolls back too; the broadcast
                    // error stays the one reported.
                    if let Err(rollback) = txn.rollback() {
                        warn!(error = %rollback, "Rollback after failed broadcast failed");
                    }
                    Err(BoardError::Broadcast(e))
                }
                BroadcastFailurePolicy::Log => {
                    txn.commit()?;
                    warn!(id = %message.id, error = %e, "Message saved but broadcast failed");
                    Ok(message)
                }
            },
        }
    }

    fn validate(&self, content: &str) -> BoardResult<()> {
        if content.trim().is_empty() {
            return Err(BoardError::validation("Message can't be blank"));
        }
        let length = content.chars().count();
        if length > self.max_length {
            return Err(BoardError::validation(format!(
                "Message is too long ({} characters, maximum is {})",
                length, self.max_length
            )));
        }
        Ok(())
    }

    /// Every message, newest first.
    pub async fn list_all(&self) -> BoardResult<Vec<Message>> {
        self.list(None).await
    }

    /// The `limit` most recent messages, newest first.
    pub async fn list_recent(&self, limit: usize) -> BoardResult<Vec<Message>> {
        self.list(Some(limit)).await
    }

    async fn list(&self, limit: Option<usize>) -> BoardResult<Vec<Message>> {
        let rows = self
            .pool
            .with_conn(|conn| queries::list_messages(conn, limit))
            .await?;
        debug!(count = rows.len(), "Listed messages");
        Ok(rows.into_iter().map(Message::from_row).collect())
    }

    /// Get a message by ID.
    pub async fn get(&self, id: &str) -> BoardResult<Message> {
        let row = self
            .pool
            .with_conn(|conn| queries::get_message(conn, id))
            .await
            .map_err(|e| match e {
                msgboard_db::DbError::NotFound(_) => BoardError::MessageNotFound(id.to_string()),
                e => BoardError::Database(e),
            })?;
        Ok(Message::from_row(row))
    }

    /// Number of stored messages.
    pub async fn count(&self) -> BoardResult<i64> {
        Ok(self.pool.with_conn(queries::count_messages).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use msgboard_cable::{CableError, CableHub, CableResult};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Records every publish.
    #[derive(Default)]
    pub struct RecordingBroadcaster {
        pub published: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl Broadcaster for RecordingBroadcaster {
        async fn publish(&self, topic: &str, payload: &Value) -> CableResult<usize> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.clone()));
            Ok(1)
        }
    }

    /// Always fails, like an unreachable transport.
    pub struct DownBroadcaster;

    #[async_trait]
    impl Broadcaster for DownBroadcaster {
        async fn publish(&self, _topic: &str, _payload: &Value) -> CableResult<usize> {
            Err(CableError::Unavailable("transport down".to_string()))
        }
    }

    /// Signals when a publish starts, then takes `delay` to finish it.
    pub struct SlowBroadcaster {
        pub started: Arc<Notify>,
        pub delay: Duration,
    }

    #[async_trait]
    impl Broadcaster for SlowBroadcaster {
        async fn publish(&self, _topic: &str, _payload: &Value) -> CableResult<usize> {
            self.started.notify_one();
            tokio::time::sleep(self.delay).await;
            Ok(0)
        }
    }

    fn service_with(broadcaster: Arc<dyn Broadcaster>) -> MessageService {
        MessageService::new(DbPool::in_memory().unwrap(), broadcaster)
    }

    #[tokio::test]
    async fn test_create_persists_and_broadcasts_once() {
        let recorder = Arc::new(RecordingBroadcaster::default());
        let service = service_with(recorder.clone());

        let message = service.create("hello").await.unwrap();
        assert_eq!(message.content, "hello");
        assert!(!message.id.is_empty());
        assert!(!message.created_at.is_empty());

        assert_eq!(service.count().await.unwrap(), 1);
        assert_eq!(service.get(&message.id).await.unwrap(), message);

        let published = recorder.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "message");
        assert_eq!(published[0].1, json!({"data": "hello"}));
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let service = service_with(Arc::new(CableHub::default()));
        for content in ["A", "B", "C"] {
            service.create(content).await.unwrap();
        }

        let contents: Vec<String> = service
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["C", "B", "A"]);

        let recent = service.list_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content, "C");
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        let recorder = Arc::new(RecordingBroadcaster::default());
        let service = service_with(recorder.clone());

        for blank in ["", "   ", "\n\t"] {
            let err = service.create(blank).await.unwrap_err();
            assert!(matches!(err, BoardError::ValidationError(_)));
        }

        assert_eq!(service.count().await.unwrap(), 0);
        assert!(recorder.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_too_long_content_is_rejected() {
        let service = service_with(Arc::new(CableHub::default())).with_max_length(5);

        assert!(service.create("12345").await.is_ok());
        let err = service.create("123456").await.unwrap_err();
        assert!(matches!(err, BoardError::ValidationError(_)));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_failure_rolls_back_by_default() {
        let service = service_with(Arc::new(DownBroadcaster));
        assert_eq!(service.policy(), BroadcastFailurePolicy::Propagate);

        let err = service.create("hello").await.unwrap_err();
        assert!(matches!(err, BoardError::Broadcast(CableError::Unavailable(_))));
        assert!(err.to_string().contains("transport down"));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_failure_logged_keeps_message() {
        let service =
            service_with(Arc::new(DownBroadcaster)).with_policy(BroadcastFailurePolicy::Log);

        let message = service.create("hello").await.unwrap();
        assert_eq!(service.list_all().await.unwrap(), vec![message]);
    }

    #[tokio::test]
    async fn test_hub_subscribers_see_created_message() {
        let hub = CableHub::default();
        let mut rx = hub.subscribe();
        let service = service_with(Arc::new(hub));

        service.create("live").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, MESSAGE_TOPIC);
        assert_eq!(event.payload, json!({"data": "live"}));
    }

    #[tokio::test]
    async fn test_get_unknown_message() {
        let service = service_with(Arc::new(CableHub::default()));
        let err = service.get("missing").await.unwrap_err();
        assert!(matches!(err, BoardError::MessageNotFound(_)));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            max_length: 10,
            broadcast_failure: BroadcastFailurePolicy::Log,
            ..Config::default()
        };
        let service = MessageService::from_config(
            DbPool::in_memory().unwrap(),
            Arc::new(CableHub::default()),
            &config,
        );
        assert_eq!(service.policy(), BroadcastFailurePolicy::Log);
        assert!(service.draft().content.is_empty());
    }

    #[tokio::test]
    async fn test_listing_does_not_wait_for_inflight_publish() {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = DbPool::open(&dir.path().join("board.db")).unwrap();
        let started = Arc::new(Notify::new());
        let service = MessageService::new(
            pool,
            Arc::new(SlowBroadcaster {
                started: started.clone(),
                delay: Duration::from_secs(3),
            }),
        );

        let writer = service.clone();
        let pending = tokio::spawn(async move { writer.create("slow").await });
        started.notified().await;

        let listed = tokio::time::timeout(Duration::from_secs(1), service.list_all())
            .await
            .expect("listing waited for the in-flight publish")
            .unwrap();
        assert!(listed.is_empty());

        let created = pending.await.unwrap().unwrap();
        assert_eq!(service.list_all().await.unwrap(), vec![created]);
    }
}
