//! Short code generation and validation utilities.
//!
//! Provides random code generation and validation for user-provided aliases.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Shortest accepted generated code length.
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest accepted generated code length (128 bits of entropy).
pub const MAX_CODE_LENGTH: usize = 22;

/// Bounds for user-provided aliases.
const MIN_ALIAS_LENGTH: usize = 4;
const MAX_ALIAS_LENGTH: usize = 32;

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("alias regex is valid"));

/// Codes that cannot be used as short links.
///
/// These collide with service routes.
pub const RESERVED_CODES: &[&str] = &["health", "api", "admin", "static", "favicon.ico"];

/// Returns true if `code` shadows a service route.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

/// Generates a random short code of `length` characters.
///
/// Draws OS entropy via `getrandom`, encodes it as URL-safe base64 without
/// padding and truncates the result. Codes that shadow a reserved route are
/// redrawn.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(5)?;
/// assert_eq!(code.len(), 5);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn generate_code(length: usize) -> Result<String, AppError> {
    let length = length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
    // Each base64 character carries 6 bits.
    let mut buffer = vec![0u8; (length * 6).div_ceil(8)];

    loop {
        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::internal(
                "Failed to generate random bytes",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
        code.truncate(length);

        if !is_reserved(&code) {
            return Ok(code);
        }
    }
}

/// Validates a user-provided alias.
///
/// # Rules
///
/// - Length: 4-32 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot start or end with a hyphen
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_alias("promo-2025").is_ok());
/// assert!(validate_alias("abc").is_err());      // Too short
/// assert!(validate_alias("-promo").is_err());   // Starts with hyphen
/// assert!(validate_alias("health").is_err());   // Reserved
/// ```
pub fn validate_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_ALIAS_LENGTH {
        return Err(AppError::bad_request(
            format!(
                "Custom short URL must be {}-{} characters",
                MIN_ALIAS_LENGTH, MAX_ALIAS_LENGTH
            ),
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !ALIAS_REGEX.is_match(alias) {
        return Err(AppError::bad_request(
            "Custom short URL can only contain letters, digits, hyphens and underscores",
            json!({ "custom-short-url": alias }),
        ));
    }

    if alias.starts_with('-') || alias.ends_with('-') {
        return Err(AppError::bad_request(
            "Custom short URL cannot start or end with a hyphen",
            json!({ "custom-short-url": alias }),
        ));
    }

    if is_reserved(alias) {
        return Err(AppError::bad_request(
            "This short URL is reserved",
            json!({ "custom-short-url": alias }),
        ));
    }

    Ok(())
}
