//! Process-local store implementation.

use crate::domain::entities::{ConsumeOutcome, QuotaStatus};
use crate::domain::repositories::{MappingRepository, QuotaRepository};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Number of entries above which expired keys are swept on write.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
enum Value {
    Counter(i64),
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value, expires_at: Instant) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// Store backed by a concurrent hash map.
///
/// Mirrors the Redis semantics the service relies on: per-key atomic
/// operations and lazy expiry. Time is read from `tokio::time`, so tests can
/// pause and advance the clock.
///
/// State lives in the process; use it for single-node runs without Redis
/// and for tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, Slot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        debug!("Using InMemoryStore");
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_expired(&self) {
        if self.entries.len() > SWEEP_THRESHOLD {
            let now = Instant::now();
            self.entries.retain(|_, slot| !slot.is_expired(now));
        }
    }

    fn live(&self, key: &str) -> Option<Slot> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|slot| !slot.is_expired(now))
            .map(|slot| slot.value().clone())
    }
}

#[async_trait]
impl QuotaRepository for InMemoryStore {
    async fn consume(
        &self,
        key: &str,
        quota: i64,
        window: Duration,
    ) -> Result<ConsumeOutcome, AppError> {
        self.sweep_expired();

        let now = Instant::now();
        let fresh = || Slot::new(Value::Counter(quota), now + window);

        let mut slot = self.entries.entry(key.to_owned()).or_insert_with(fresh);
        if slot.is_expired(now) {
            *slot = fresh();
        }
        if slot.expires_at.is_none() {
            slot.expires_at = Some(now + window);
        }

        let reset_in = slot.remaining(now).unwrap_or(window);
        let Value::Counter(counter) = &mut slot.value else {
            return Err(AppError::store_unavailable(
                "Quota counter is not an integer",
                json!({ "key": key }),
            ));
        };

        if *counter <= 0 {
            return Ok(ConsumeOutcome::Exhausted(QuotaStatus::new(
                *counter, reset_in,
            )));
        }

        *counter -= 1;
        Ok(ConsumeOutcome::Granted(QuotaStatus::new(*counter, reset_in)))
    }

    async fn peek(&self, key: &str) -> Result<Option<QuotaStatus>, AppError> {
        let now = Instant::now();
        match self.live(key) {
            None => Ok(None),
            Some(Slot {
                value: Value::Counter(remaining),
                expires_at,
            }) => Ok(Some(QuotaStatus::new(
                remaining,
                expires_at
                    .map(|at| at.saturating_duration_since(now))
                    .unwrap_or(Duration::ZERO),
            ))),
            Some(_) => Err(AppError::store_unavailable(
                "Quota counter is not an integer",
                json!({ "key": key }),
            )),
        }
    }

    async fn reset(&self, key: &str) -> Result<bool, AppError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, slot)| !slot.is_expired(now)))
    }
}

#[async_trait]
impl MappingRepository for InMemoryStore {
    async fn insert(
        &self,
        key: &str,
        target: &str,
        ttl: Duration,
        overwrite: bool,
    ) -> Result<bool, AppError> {
        self.sweep_expired();

        let now = Instant::now();
        let slot = Slot::new(Value::Text(target.to_owned()), now + ttl);

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if !overwrite && !occupied.get().is_expired(now) {
                    return Ok(false);
                }
                occupied.insert(slot);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
        }

        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.live(key) {
            None => Ok(None),
            Some(Slot {
                value: Value::Text(target),
                ..
            }) => Ok(Some(target)),
            Some(_) => Err(AppError::store_unavailable(
                "Key does not hold a URL",
                json!({ "key": key }),
            )),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AppError> {
        let now = Instant::now();
        Ok(self.live(key).and_then(|slot| slot.remaining(now)))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
