//! Single-write, single-read result handoff between `/predict` and `/results`.
//!
//! A record is stored under the caller's session key and evicted by the first
//! read. Unread records expire after the configured TTL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use tokio::time::Instant;
use tracing::error;

use crate::errors::AppError;
use crate::models::result::ResultRecord;

const KEY_PREFIX: &str = "screener:result";

#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// Stores `record`, replacing any unread record for the same session.
    async fn put(&self, session: &str, record: ResultRecord) -> Result<(), AppError>;

    /// Removes and returns the pending record, if any.
    async fn take(&self, session: &str) -> Result<Option<ResultRecord>, AppError>;
}

pub struct InMemoryHandoffStore {
    ttl: Duration,
    slots: Mutex<HashMap<String, (ResultRecord, Instant)>>,
}

impl InMemoryHandoffStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl HandoffStore for InMemoryHandoffStore {
    async fn put(&self, session: &str, record: ResultRecord) -> Result<(), AppError> {
        let now = Instant::now();
        let mut slots = self.slots.lock();
        slots.retain(|_, (_, stored_at)| now.duration_since(*stored_at) < self.ttl);
        slots.insert(session.to_string(), (record, now));
        Ok(())
    }

    async fn take(&self, session: &str) -> Result<Option<ResultRecord>, AppError> {
        let now = Instant::now();
        let taken = self.slots.lock().remove(session);
        Ok(taken
            .filter(|(_, stored_at)| now.duration_since(*stored_at) < self.ttl)
            .map(|(record, _)| record))
    }
}

/// Records stored as JSON strings with `EX ttl`, consumed with `GETDEL`.
pub struct RedisHandoffStore {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl RedisHandoffStore {
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    fn key(session: &str) -> String {
        format!("{KEY_PREFIX}:{session}")
    }
}

fn store_error(context: &str, e: impl std::fmt::Display) -> AppError {
    error!("{}: {}", context, e);
    AppError::Store(format!("{context}: {e}"))
}

#[async_trait]
impl HandoffStore for RedisHandoffStore {
    async fn put(&self, session: &str, record: ResultRecord) -> Result<(), AppError> {
        let payload = serde_json::to_string(&record)
            .map_err(|e| store_error("Failed to serialize result", e))?;
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(Self::key(session))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error("Failed to store result", e))?;
        Ok(())
    }

    async fn take(&self, session: &str) -> Result<Option<ResultRecord>, AppError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = redis::cmd("GETDEL")
            .arg(Self::key(session))
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error("Failed to read result", e))?;

        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(|e| store_error("Stored result is corrupt", e))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(role: &str) -> ResultRecord {
        ResultRecord {
            success: true,
            predicted_role: role.to_string(),
            extracted_text: "text".to_string(),
            genai_suggestions: "<div></div>".to_string(),
            analyzed_at: Utc::now(),
        }
    }

    fn store() -> InMemoryHandoffStore {
        InMemoryHandoffStore::new(Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_take_consumes_record() {
        let store = store();
        store.put("s1", record("HR")).await.unwrap();
        let first = store.take("s1").await.unwrap();
        assert_eq!(first.map(|r| r.predicted_role), Some("HR".to_string()));
        assert!(store.take("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_without_put_is_empty() {
        assert!(store().take("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_put_replaces_unread_record() {
        let store = store();
        store.put("s1", record("HR")).await.unwrap();
        store.put("s1", record("Testing")).await.unwrap();
        let taken = store.take("s1").await.unwrap().unwrap();
        assert_eq!(taken.predicted_role, "Testing");
        assert!(store.take("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = store();
        store.put("a", record("HR")).await.unwrap();
        assert!(store.take("b").await.unwrap().is_none());
        assert!(store.take("a").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_record_expires() {
        let store = store();
        store.put("s1", record("HR")).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(store.take("s1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_prunes_expired_slots() {
        let store = store();
        store.put("old", record("HR")).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        store.put("new", record("Testing")).await.unwrap();
        assert_eq!(store.slots.lock().len(), 1);
    }

    #[test]
    fn test_redis_key_is_namespaced() {
        assert_eq!(RedisHandoffStore::key("abc"), "screener:result:abc");
    }

    /// Runs against a live server only when `TEST_REDIS_URL` is set.
    async fn redis_store() -> Option<RedisHandoffStore> {
        let url = std::env::var("TEST_REDIS_URL").ok()?;
        let client = redis::Client::open(url).unwrap();
        let conn = client.get_multiplexed_async_connection().await.unwrap();
        Some(RedisHandoffStore::new(conn, Duration::from_secs(600)))
    }

    #[tokio::test]
    async fn test_redis_take_consumes_record() {
        let Some(store) = redis_store().await else {
            return;
        };
        let session = uuid::Uuid::new_v4().to_string();
        store.put(&session, record("HR")).await.unwrap();
        store.put(&session, record("Testing")).await.unwrap();
        let taken = store.take(&session).await.unwrap().unwrap();
        assert_eq!(taken.predicted_role, "Testing");
        assert!(store.take(&session).await.unwrap().is_none());
    }
}
