//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`NewShortLink`] - Input for creating a short link
//! - [`ShortLink`] - A freshly written code → URL mapping
//! - [`QuotaStatus`] - Remaining calls and time until the window resets
//! - [`ConsumeOutcome`] - Result of charging one call against a quota
//! - [`CollisionPolicy`] - What to do when a generated code is already taken

pub mod quota;
pub mod short_link;

pub use quota::{ConsumeOutcome, QuotaStatus};
pub use short_link::{CollisionPolicy, NewShortLink, ShortLink};
