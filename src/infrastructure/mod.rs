//! Infrastructure layer for external integrations.
//!
//! This layer implements the store traits defined by the domain layer.
//!
//! # Modules
//!
//! - [`store`] - Redis-backed and in-memory key-value stores with expiring keys

pub mod store;
