//! Business logic services for the application layer.

pub mod link_service;
pub mod rate_limiter;

pub use link_service::{LinkService, LinkSettings, Shortened};
pub use rate_limiter::{QuotaPolicy, RateLimiter};
