//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /`        - Shorten a URL
//! - `GET  /{code}`  - Short link redirect
//! - `GET  /health`  - Health check
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling
//!
//! Rate limiting is not a layer: only shortening is charged, inside
//! [`crate::application::services::LinkService::shorten`].

use crate::api;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so handlers can
/// read the peer address.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = api::routes::public_routes()
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
