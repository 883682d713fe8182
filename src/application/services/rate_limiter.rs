//! Per-client rate limiting for link creation.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{ConsumeOutcome, QuotaStatus};
use crate::domain::repositories::QuotaRepository;
use crate::error::AppError;
use serde_json::json;
use tracing::{debug, warn};

/// Quota granted to every client per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Calls allowed per window.
    pub quota: i64,
    /// Lifetime of a client's counter, starting at its first call.
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            quota: 10,
            window: Duration::from_secs(30 * 60),
        }
    }
}

/// Bounds how many links a client identity may create per window.
///
/// All state lives in the store: the counter is seeded on a client's first
/// call, decremented on every call after that and expires with the window.
/// Concurrent calls for the same client are serialized by the store's
/// atomic consume operation; no in-process locks are held.
pub struct RateLimiter {
    store: Arc<dyn QuotaRepository>,
    policy: QuotaPolicy,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(store: Arc<dyn QuotaRepository>, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    /// Charges one call to `client_id` and returns the quota left afterwards.
    ///
    /// A client's very first call seeds the counter to the full quota before
    /// charging, so a fresh client sees `quota - 1` remaining.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::QuotaExhausted`] once the counter has reached zero;
    /// the exhausted call is not charged.
    /// Returns [`AppError::StoreUnavailable`] if the store fails.
    pub async fn check_and_consume(&self, client_id: &str) -> Result<QuotaStatus, AppError> {
        let outcome = self
            .store
            .consume(client_id, self.policy.quota, self.policy.window)
            .await?;

        match outcome {
            ConsumeOutcome::Granted(status) => {
                debug!(
                    "Quota charged for {}: {} left, resets in {:?}",
                    client_id, status.remaining, status.reset_in
                );
                Ok(status)
            }
            ConsumeOutcome::Exhausted(status) => {
                warn!(
                    "Quota exhausted for {}, resets in {:?}",
                    client_id, status.reset_in
                );
                metrics::counter!("shortener_quota_exhausted_total").increment(1);
                Err(AppError::quota_exhausted(
                    "Max API calls reached for the time period",
                    status.reset_in,
                ))
            }
        }
    }

    /// Current quota of `client_id` without charging it.
    ///
    /// A client without an active window reports the full quota.
    pub async fn status(&self, client_id: &str) -> Result<QuotaStatus, AppError> {
        Ok(self
            .store
            .peek(client_id)
            .await?
            .unwrap_or(QuotaStatus::new(self.policy.quota, Duration::ZERO)))
    }

    /// Drops the counter of `client_id`, giving it a fresh window.
    pub async fn reset(&self, client_id: &str) -> Result<bool, AppError> {
        if client_id.is_empty() {
            return Err(AppError::missing_parameter(
                "Client identity is required",
                json!({}),
            ));
        }
        self.store.reset(client_id).await
    }
}
