//! Sliding-window rate limiting keyed by client identity (peer IP).
//!
//! Each identity keeps the timestamps of its accepted requests. An attempt is
//! accepted while fewer than `max_requests` of them fall inside the window.
//! Rejected attempts are not recorded.
//!
//! `AppState` holds an `Arc<dyn RateLimiter>`: in-memory by default, Redis when
//! `REDIS_URL` is set so several instances share one ledger.

use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Once this many identities are tracked, the next new identity triggers a
/// sweep of identities whose newest stamp has left the window. Identities
/// still inside their window are never evicted, so the map can grow past it.
const MAX_TRACKED_IDENTITIES: usize = 10_000;
const KEY_PREFIX: &str = "screener:ratelimit";

/// Prune, count and conditionally record in one server-side step.
/// KEYS[1] ledger; ARGV cutoff, ceiling, now, member, expiry.
static SLIDING_WINDOW: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
if redis.call('ZCARD', KEYS[1]) >= tonumber(ARGV[2]) then
    return 0
end
redis.call('ZADD', KEYS[1], ARGV[3], ARGV[4])
redis.call('EXPIRE', KEYS[1], ARGV[5])
return 1
",
    )
});

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records and accepts the attempt, or rejects it without recording.
    async fn allow(&self, identity: &str) -> bool;
}

/// Per-process sliding-window ledger.
///
/// Limitations: the ledger lives in this process only, so each instance of a
/// multi-instance deployment enforces its own ceiling (use
/// [`RedisRateLimiter`] there). Key growth is bounded only by the sweep at
/// [`MAX_TRACKED_IDENTITIES`]: idle identities are dropped then, active ones
/// are kept, so a flood of distinct live addresses still grows the map.
pub struct InMemoryRateLimiter {
    max_requests: usize,
    window: Duration,
    ledger: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ledger: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, identity: &str, now: Instant) -> bool {
        let mut ledger = self.ledger.lock();

        if ledger.len() >= MAX_TRACKED_IDENTITIES && !ledger.contains_key(identity) {
            ledger.retain(|_, stamps| {
                stamps
                    .back()
                    .is_some_and(|last| now.duration_since(*last) < self.window)
            });
        }

        let stamps = ledger.entry(identity.to_string()).or_default();
        while stamps
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push_back(now);
        true
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn allow(&self, identity: &str) -> bool {
        self.check(identity, Instant::now())
    }
}

/// Sorted-set ledger shared by every instance: one member per accepted
/// request, scored by epoch millis. Fails open when Redis is unreachable.
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    max_requests: usize,
    window: Duration,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, max_requests: usize, window: Duration) -> Self {
        Self {
            conn,
            max_requests,
            window,
        }
    }

    async fn check(&self, identity: &str) -> redis::RedisResult<bool> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let (cutoff, expire_secs) = window_bounds(now_ms, self.window);

        let mut conn = self.conn.clone();
        let accepted: i64 = SLIDING_WINDOW
            .key(ledger_key(identity))
            .arg(cutoff)
            .arg(self.max_requests)
            .arg(now_ms)
            .arg(Uuid::new_v4().to_string())
            .arg(expire_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(accepted == 1)
    }
}

fn ledger_key(identity: &str) -> String {
    format!("{KEY_PREFIX}:{identity}")
}

/// Inclusive score cutoff (entries exactly one window old are dropped) and key
/// expiry in whole seconds.
fn window_bounds(now_ms: i64, window: Duration) -> (i64, i64) {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    let expire_secs = i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX);
    (now_ms.saturating_sub(window_ms), expire_secs)
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, identity: &str) -> bool {
        match self.check(identity).await {
            Ok(allowed) => {
                debug!(identity, allowed, "Rate limit check");
                allowed
            }
            Err(e) => {
                warn!("Rate limiter unavailable, allowing request: {}", e);
                true
            }
        }
    }
}
