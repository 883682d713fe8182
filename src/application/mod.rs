//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating store calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::rate_limiter::RateLimiter`] - Per-client quota over a fixed window
//! - [`services::link_service::LinkService`] - Short link creation and resolution

pub mod services;
