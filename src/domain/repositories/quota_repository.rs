//! Store trait for per-client quota counters.

use crate::domain::entities::{ConsumeOutcome, QuotaStatus};
use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Repository interface for rate-limit counters.
///
/// A counter is created on first use, lives for a fixed window and then
/// expires on its own. No in-process locking is involved; atomicity comes
/// from the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaRepository: Send + Sync {
    /// Charges one call against the counter at `key`.
    ///
    /// # Semantics
    ///
    /// 1. Absent counter: seed it to `quota` with TTL `window`, then decrement.
    ///    The seeding itself is free.
    /// 2. Counter `<= 0`: return [`ConsumeOutcome::Exhausted`] without
    ///    decrementing further.
    /// 3. Otherwise decrement by one.
    ///
    /// The post-decrement value and remaining TTL are read in the same
    /// operation. A counter found without a TTL is re-armed with `window`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on communication failures,
    /// timeouts or a counter that does not hold an integer.
    async fn consume(
        &self,
        key: &str,
        quota: i64,
        window: Duration,
    ) -> Result<ConsumeOutcome, AppError>;

    /// Reads the counter without charging it.
    ///
    /// Returns `Ok(None)` if the client has no active window.
    async fn peek(&self, key: &str) -> Result<Option<QuotaStatus>, AppError>;

    /// Deletes the counter so the next call starts a fresh window.
    ///
    /// Returns `Ok(true)` if a counter existed.
    async fn reset(&self, key: &str) -> Result<bool, AppError>;
}
