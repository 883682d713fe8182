//! # Quota Shortener
//!
//! A URL shortening service with a per-client creation quota, built with
//! Axum and Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities and store traits
//! - **Application Layer** ([`application`]) - Rate limiting and the shorten/resolve workflow
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-memory stores
//! - **API Layer** ([`api`]) - HTTP handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Short links with a configurable lifetime
//! - Optional custom aliases
//! - Per-client fixed-window quota shared through Redis
//! - Redirects that are never rate limited
//!
//! ## Quick Start
//!
//! ```bash
//! export DOMAIN="short.ly"
//! export REDIS_URL="redis://localhost:6379"  # Optional, in-memory otherwise
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        LinkService, LinkSettings, QuotaPolicy, RateLimiter, Shortened,
    };
    pub use crate::domain::entities::{CollisionPolicy, NewShortLink, QuotaStatus, ShortLink};
    pub use crate::error::AppError;
    pub use crate::infrastructure::store::{InMemoryStore, RedisStore};
    pub use crate::state::AppState;
}
