//! DTOs for link shortening endpoint.

use crate::application::services::Shortened;
use crate::domain::entities::NewShortLink;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::time::Duration;
use validator::Validate;

/// Request to shorten a single URL.
///
/// ```json
/// { "url": "https://example.com/page", "custom-short-url": "docs", "expiry": 3600 }
/// ```
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ShortenRequest {
    /// The URL to shorten (must be a valid absolute URL).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional alias to use instead of a generated code.
    #[serde(default)]
    #[validate(length(max = 32, message = "Custom short URL is too long"))]
    pub custom_short_url: Option<String>,

    /// Optional link lifetime in seconds; absent or `0` uses the default.
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(default)]
    pub expiry: Option<Duration>,
}

impl From<ShortenRequest> for NewShortLink {
    fn from(request: ShortenRequest) -> Self {
        NewShortLink {
            url: request.url,
            custom_alias: request.custom_short_url,
            expiry: request.expiry,
        }
    }
}

/// Created link plus the caller's remaining quota.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub url: String,

    #[serde(rename = "custom-short-url")]
    pub custom_short_url: String,

    /// Calls left in the current window.
    #[serde(rename = "x-rate-limit")]
    pub rate_limit: i64,

    /// Whole minutes until the window resets.
    #[serde(rename = "x-rate-reset-duration-min")]
    pub rate_reset_duration_min: u64,

    /// Lifetime of the link in seconds.
    pub expiry: u64,
}

impl From<Shortened> for ShortenResponse {
    fn from(shortened: Shortened) -> Self {
        Self {
            rate_limit: shortened.quota.remaining,
            rate_reset_duration_min: shortened.quota.reset_in_minutes(),
            expiry: shortened.link.expiry.as_secs(),
            url: shortened.link.target_url,
            custom_short_url: shortened.link.short_url,
        }
    }
}
