//! Store trait definitions for the domain layer.
//!
//! These traits abstract the key-value store with expiring keys that owns all
//! shared state. Services depend only on the traits, so tests substitute
//! generated mocks or the in-memory store.
//!
//! # Available Repositories
//!
//! - [`QuotaRepository`] - Per-client counters with a fixed window
//! - [`MappingRepository`] - Short link → target URL mappings with expiry
//!
//! # Implementations
//!
//! - `crate::infrastructure::store::RedisStore`
//! - `crate::infrastructure::store::InMemoryStore`
//! - Mocks auto-generated via `mockall` with `cfg(test)`

pub mod mapping_repository;
pub mod quota_repository;

pub use mapping_repository::MappingRepository;
pub use quota_repository::QuotaRepository;

#[cfg(test)]
pub use mapping_repository::MockMappingRepository;
#[cfg(test)]
pub use quota_repository::MockQuotaRepository;
