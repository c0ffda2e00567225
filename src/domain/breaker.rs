//! Circuit breaker and degradation state shared with health reporting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Circuit breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of one call-site's breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Process-wide service level, ordered from full to most reduced.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DegradationLevel {
    #[default]
    Normal,
    /// Sentiment lookups are skipped.
    Reduced,
    /// Sentiment and history lookups are skipped.
    Minimal,
    /// Cycles are skipped entirely. Only an operator sets or clears this.
    Emergency,
}

impl DegradationLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reduced => "reduced",
            Self::Minimal => "minimal",
            Self::Emergency => "emergency",
        }
    }

    #[must_use]
    pub const fn allows_sentiment(self) -> bool {
        matches!(self, Self::Normal)
    }

    #[must_use]
    pub const fn allows_history(self) -> bool {
        matches!(self, Self::Normal | Self::Reduced)
    }

    #[must_use]
    pub const fn allows_cycles(self) -> bool {
        !matches!(self, Self::Emergency)
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Reduced => 1,
            Self::Minimal => 2,
            Self::Emergency => 3,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Reduced,
            2 => Self::Minimal,
            _ => Self::Emergency,
        }
    }
}

impl fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
