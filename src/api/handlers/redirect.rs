//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Resolution is not rate limited. Live mappings answer with
/// `308 Permanent Redirect`.
///
/// # Errors
///
/// Returns 400 Bad Request if the code is unknown or expired.
/// Returns 500 if the store is unavailable.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let target = state.link_service.resolve(&code).await?;

    Ok(Redirect::permanent(&target))
}

/// `GET /` without a code.
pub async fn missing_code_handler(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let target = state.link_service.resolve("").await?;

    Ok(Redirect::permanent(&target))
}
