//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::HeaderMap,
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_id;

/// Creates a short link for one URL, charged against the caller's quota.
///
/// # Endpoint
///
/// `POST /`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/page",
///   "custom-short-url": "docs",  // optional
///   "expiry": 3600                // optional, seconds
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "url": "https://example.com/page",
///   "custom-short-url": "short.ly/aZ3_k",
///   "x-rate-limit": 9,
///   "x-rate-reset-duration-min": 30,
///   "expiry": 86400
/// }
/// ```
///
/// # Errors
///
/// - 400 for malformed bodies, invalid URLs and links back into the service
/// - 409 if the custom alias is taken
/// - 429 with `Retry-After` once the caller's quota is used up
/// - 500 if the store is unavailable
pub async fn shorten_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let client = client_id(&headers, peer, state.behind_proxy);

    let shortened = state
        .link_service
        .shorten(payload.into(), &client)
        .await?;

    Ok(Json(shortened.into()))
}
