//! Short link entity and code collision policy.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A code → URL mapping that has just been written to the store.
///
/// Mappings are immutable: there is no update path, and shortening the same
/// URL twice yields two independent mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    pub code: String,
    /// Absolute short link, `{domain}/{code}`. Also the store key.
    pub short_url: String,
    pub target_url: String,
    pub expiry: Duration,
}

impl ShortLink {
    pub fn new(code: String, short_url: String, target_url: String, expiry: Duration) -> Self {
        Self {
            code,
            short_url,
            target_url,
            expiry,
        }
    }
}

/// Input for creating a short link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewShortLink {
    /// Target URL as submitted by the client.
    pub url: String,
    /// User-chosen code; a random one is generated when absent.
    pub custom_alias: Option<String>,
    /// Requested lifetime; `None` or zero selects the service default.
    pub expiry: Option<Duration>,
}

impl NewShortLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.custom_alias = Some(alias.into());
        self
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Behavior when a generated code is already mapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Write unconditionally; an existing mapping's target is replaced.
    #[default]
    Overwrite,
    /// Never replace an existing mapping; draw a new code instead.
    Reject,
}

impl CollisionPolicy {
    pub fn allows_overwrite(&self) -> bool {
        matches!(self, Self::Overwrite)
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown collision policy '{}', expected 'overwrite' or 'reject'",
                other
            )),
        }
    }
}
