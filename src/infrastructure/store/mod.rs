//! Key-value stores with expiring keys.
//!
//! Provides two implementations of both
//! [`QuotaRepository`](crate::domain::repositories::QuotaRepository) and
//! [`MappingRepository`](crate::domain::repositories::MappingRepository):
//! - [`RedisStore`] - Production store shared by every instance of the service
//! - [`InMemoryStore`] - Process-local fallback for development and tests

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryStore;
pub use redis_store::RedisStore;

use std::time::Duration;

/// Converts a TTL to whole milliseconds, never less than one.
///
/// Stores reject zero TTLs, and `PX` arguments must fit in a signed 64-bit integer.
pub(crate) fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_secs(2)), 2000);
    }

    #[test]
    fn test_ttl_millis_saturates() {
        assert_eq!(ttl_millis(Duration::MAX), i64::MAX);
    }
}
