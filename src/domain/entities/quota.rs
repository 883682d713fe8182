//! Per-client quota state.

use std::time::Duration;

/// Snapshot of a client's quota window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Calls left in the current window. May be zero or negative once
    /// exhausted; callers must treat `<= 0` as "no calls left".
    pub remaining: i64,
    /// Time until the counter expires and the window starts over.
    pub reset_in: Duration,
}

impl QuotaStatus {
    pub fn new(remaining: i64, reset_in: Duration) -> Self {
        Self {
            remaining,
            reset_in,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }

    /// Window reset time rounded down to whole minutes.
    pub fn reset_in_minutes(&self) -> u64 {
        self.reset_in.as_secs() / 60
    }
}

/// Result of charging one call against a client's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The call was charged; `status` holds the post-decrement counter.
    Granted(QuotaStatus),
    /// The counter was already at or below zero and was left untouched.
    Exhausted(QuotaStatus),
}

impl ConsumeOutcome {
    pub fn status(&self) -> QuotaStatus {
        match self {
            Self::Granted(status) | Self::Exhausted(status) => *status,
        }
    }
}
