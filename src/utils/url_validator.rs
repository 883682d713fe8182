//! Target URL validation.
//!
//! A URL may be shortened when it is an absolute HTTP(S) URL that does not
//! point back into the service itself.

use url::Url;

/// Reasons a target URL is refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL is required")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("The URL cannot include the service domain")]
    SelfReferential,
}

/// Checks that `input` is a syntactically valid absolute HTTP(S) URL.
///
/// Rejects dangerous schemes such as `javascript:`, `data:` and `file:`.
///
/// # Errors
///
/// Returns [`UrlValidationError::Empty`], [`UrlValidationError::InvalidFormat`],
/// [`UrlValidationError::UnsupportedProtocol`] or [`UrlValidationError::MissingHost`].
pub fn validate_target_url(input: &str) -> Result<Url, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url =
        Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Returns true if `input` mentions the service's own domain anywhere.
///
/// The check is a case-insensitive substring match, so it also catches the
/// domain appearing in a path or query parameter of another host.
pub fn contains_domain(input: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return false;
    }
    input
        .to_ascii_lowercase()
        .contains(&domain.to_ascii_lowercase())
}

/// Validates `input` and rejects URLs that point back into the service.
///
/// # Errors
///
/// See [`validate_target_url`]; additionally returns
/// [`UrlValidationError::SelfReferential`] when [`contains_domain`] matches
/// either the input or its parsed form.
pub fn check_shortenable(input: &str, domain: &str) -> Result<Url, UrlValidationError> {
    let url = validate_target_url(input)?;

    // The parser drops tabs and newlines, so check both forms.
    if contains_domain(input, domain) || contains_domain(url.as_str(), domain) {
        return Err(UrlValidationError::SelfReferential);
    }

    Ok(url)
}
