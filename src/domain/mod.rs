//! Domain layer containing business entities and store contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures (short links, quota state, policies)
//! - [`repositories`] - Store trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by the infrastructure layer
//!   (Redis in production, an in-memory map for single-node runs and tests)
//! - Business logic lives in services (see [`crate::application::services`])
//!
//! # Key Families
//!
//! The store holds exactly two kinds of keys, both with a TTL:
//!
//! ```text
//! {client_id}        → integer counter (remaining quota in the window)
//! {domain}/{code}    → target URL
//! ```

pub mod entities;
pub mod repositories;
