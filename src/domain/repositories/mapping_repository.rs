//! Store trait for short link mappings.

use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Repository interface for code → URL mappings.
///
/// Keys are fully-qualified short links (`{domain}/{code}`). Every mapping
/// carries its own TTL and disappears when it elapses; nothing is ever
/// deleted explicitly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Writes `key → target` with the given TTL.
    ///
    /// When `overwrite` is `false` the write only happens if `key` is absent.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the mapping was written
    /// - `Ok(false)` if `overwrite` is `false` and the key already existed
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store failures.
    async fn insert(
        &self,
        key: &str,
        target: &str,
        ttl: Duration,
        overwrite: bool,
    ) -> Result<bool, AppError>;

    /// Looks up the target URL stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store failures.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Remaining lifetime of the mapping, `None` if absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AppError>;

    /// Checks that the store answers.
    async fn health_check(&self) -> bool;
}
