//! API route configuration.

use crate::api::handlers::{
    health_handler, missing_code_handler, redirect_handler, shorten_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// All public routes.
///
/// # Endpoints
///
/// - `POST /`        - Shorten a URL (rate limited per client)
/// - `GET  /`        - Missing code, always 400
/// - `GET  /health`  - Store health
/// - `GET  /{code}`  - Redirect to the target URL
///
/// `/health` is a static segment and takes precedence over `/{code}`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(missing_code_handler).post(shorten_handler))
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
}
