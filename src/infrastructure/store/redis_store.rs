//! Redis-backed store implementation.

use super::ttl_millis;
use crate::domain::entities::{ConsumeOutcome, QuotaStatus};
use crate::domain::repositories::{MappingRepository, QuotaRepository};
use crate::error::AppError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, Script, aio::ConnectionManager};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

/// Charges one call against a quota counter in a single round trip.
///
/// `KEYS[1]` counter key, `ARGV[1]` starting quota, `ARGV[2]` window in ms.
/// Returns `{granted, remaining, pttl_ms}`.
const CONSUME_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
  redis.call('SET', KEYS[1], ARGV[1], 'PX', ARGV[2])
else
  local value = tonumber(current)
  if value == nil then
    return redis.error_reply('quota counter is not an integer')
  end
  if value <= 0 then
    local ttl = redis.call('PTTL', KEYS[1])
    if ttl < 0 then
      redis.call('PEXPIRE', KEYS[1], ARGV[2])
      ttl = tonumber(ARGV[2])
    end
    return {0, value, ttl}
  end
end
local remaining = redis.call('DECR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[2])
  ttl = tonumber(ARGV[2])
end
return {1, remaining, ttl}
"#;

/// Redis store for quota counters and short link mappings.
///
/// Uses a shared `ConnectionManager`; each operation works on a cheap clone
/// of it, and the manager reconnects on its own after failures. Every round
/// trip is bounded by `op_timeout`.
pub struct RedisStore {
    client: ConnectionManager,
    op_timeout: Duration,
    consume_script: Script,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379/0"`)
    /// - `op_timeout` - upper bound for every store round trip
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> Result<Self, AppError> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            AppError::store_unavailable(
                "Failed to create Redis client",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let manager = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                AppError::store_unavailable(
                    "Timed out connecting to Redis",
                    json!({ "timeout_ms": op_timeout.as_millis() as u64 }),
                )
            })?
            .map_err(|e| {
                AppError::store_unavailable(
                    "Failed to connect to Redis",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        let store = Self {
            client: manager,
            op_timeout,
            consume_script: Script::new(CONSUME_SCRIPT),
        };

        let mut conn = store.client.clone();
        store.bounded("PING", async move { conn.ping::<()>().await }).await?;

        info!("✓ Connected to Redis");

        Ok(store)
    }

    /// Runs a single store round trip under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Redis {} failed: {}", operation, e);
                Err(AppError::store_unavailable(
                    "Store error",
                    json!({ "operation": operation, "reason": e.to_string() }),
                ))
            }
            Err(_) => {
                error!(
                    "Redis {} timed out after {}ms",
                    operation,
                    self.op_timeout.as_millis()
                );
                Err(AppError::store_unavailable(
                    "Store operation timed out",
                    json!({
                        "operation": operation,
                        "timeout_ms": self.op_timeout.as_millis() as u64,
                    }),
                ))
            }
        }
    }
}

/// Converts a `PTTL` reply into a duration; negative replies mean
/// "absent" (`-2`) or "no expiry" (`-1`).
fn pttl_to_duration(pttl: i64) -> Option<Duration> {
    u64::try_from(pttl).ok().map(Duration::from_millis)
}

#[async_trait]
impl QuotaRepository for RedisStore {
    async fn consume(
        &self,
        key: &str,
        quota: i64,
        window: Duration,
    ) -> Result<ConsumeOutcome, AppError> {
        let mut conn = self.client.clone();
        let mut invocation = self.consume_script.prepare_invoke();
        invocation.key(key).arg(quota).arg(ttl_millis(window));

        let reply: Vec<i64> = self
            .bounded("EVALSHA consume", async move {
                invocation.invoke_async(&mut conn).await
            })
            .await?;

        let [granted, remaining, pttl] = reply[..] else {
            return Err(AppError::store_unavailable(
                "Unexpected reply from quota script",
                json!({ "reply": reply }),
            ));
        };

        let status = QuotaStatus::new(remaining, pttl_to_duration(pttl).unwrap_or(window));
        debug!(
            "Quota {}: granted={} remaining={} reset_in={:?}",
            key, granted, remaining, status.reset_in
        );

        Ok(if granted == 1 {
            ConsumeOutcome::Granted(status)
        } else {
            ConsumeOutcome::Exhausted(status)
        })
    }

    async fn peek(&self, key: &str) -> Result<Option<QuotaStatus>, AppError> {
        let mut conn = self.client.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().get(key).pttl(key);

        let (value, pttl): (Option<String>, i64) = self
            .bounded("GET/PTTL", async move { pipe.query_async(&mut conn).await })
            .await?;

        let Some(raw) = value else {
            return Ok(None);
        };

        let remaining = raw.parse::<i64>().map_err(|_| {
            AppError::store_unavailable(
                "Quota counter is not an integer",
                json!({ "key": key, "value": raw }),
            )
        })?;

        Ok(Some(QuotaStatus::new(
            remaining,
            pttl_to_duration(pttl).unwrap_or(Duration::ZERO),
        )))
    }

    async fn reset(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.client.clone();
        let key = key.to_owned();
        let deleted: i64 = self
            .bounded("DEL", async move { conn.del(&key).await })
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl MappingRepository for RedisStore {
    async fn insert(
        &self,
        key: &str,
        target: &str,
        ttl: Duration,
        overwrite: bool,
    ) -> Result<bool, AppError> {
        let mut conn = self.client.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(target).arg("PX").arg(ttl_millis(ttl));
        if !overwrite {
            cmd.arg("NX");
        }

        let reply: Option<String> = self
            .bounded("SET", async move { cmd.query_async(&mut conn).await })
            .await?;

        let written = reply.is_some();
        debug!(
            "Mapping SET {} -> {} (ttl: {:?}, written: {})",
            key, target, ttl, written
        );
        Ok(written)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.client.clone();
        let key = key.to_owned();
        self.bounded("GET", async move { conn.get(&key).await })
            .await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AppError> {
        let mut conn = self.client.clone();
        let key = key.to_owned();
        let pttl: i64 = self
            .bounded("PTTL", async move { conn.pttl(&key).await })
            .await?;
        Ok(pttl_to_duration(pttl))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded("PING", async move { conn.ping::<()>().await })
            .await
            .is_ok()
    }
}
