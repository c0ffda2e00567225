use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Coarse classification of upstream failures.
///
/// Retry policies are expressed as sets of kinds rather than concrete errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Timeout,
    Connection,
    Upstream,
    RateLimited,
    Malformed,
    Invalid,
}

impl SourceErrorKind {
    /// Stable name used in logs and config.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Upstream => "upstream",
            Self::RateLimited => "rate_limited",
            Self::Malformed => "malformed",
            Self::Invalid => "invalid",
        }
    }
}

/// Failure reported by a price or sentiment source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("request timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("upstream returned status {status}")]
    Upstream { status: u16 },

    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("invalid request: {0}")]
    Invalid(String),
}

impl SourceError {
    #[must_use]
    pub const fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Timeout { .. } => SourceErrorKind::Timeout,
            Self::Connection(_) => SourceErrorKind::Connection,
            Self::Upstream { .. } => SourceErrorKind::Upstream,
            Self::RateLimited { .. } => SourceErrorKind::RateLimited,
            Self::Malformed(_) => SourceErrorKind::Malformed,
            Self::Invalid(_) => SourceErrorKind::Invalid,
        }
    }
}

/// Errors raised by the resilience layer around a protected call-site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    #[error("circuit breaker '{site}' is open")]
    BreakerOpen { site: String },

    #[error("'{site}' failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        site: String,
        attempts: u32,
        #[source]
        last: SourceError,
    },

    #[error("'{site}' failed without retry: {cause}")]
    Rejected {
        site: String,
        #[source]
        cause: SourceError,
    },
}

impl ResilienceError {
    /// The call-site this error was raised for.
    #[must_use]
    pub fn site(&self) -> &str {
        match self {
            Self::BreakerOpen { site }
            | Self::RetriesExhausted { site, .. }
            | Self::Rejected { site, .. } => site,
        }
    }

    #[must_use]
    pub const fn is_breaker_open(&self) -> bool {
        matches!(self, Self::BreakerOpen { .. })
    }
}

/// Outbound notification failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("refusing to deliver an empty message")]
    EmptyMessage,

    #[error("invalid channel id '{0}'")]
    InvalidChannel(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Persistence hook failures.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Resilience(#[from] ResilienceError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_kinds() {
        let err = SourceError::RateLimited { retry_after: None };
        assert_eq!(err.kind(), SourceErrorKind::RateLimited);
        assert_eq!(err.kind().as_str(), "rate_limited");
        assert_eq!(
            SourceError::Timeout {
                after: Duration::from_secs(30)
            }
            .to_string(),
            "request timed out after 30000ms"
        );
    }

    #[test]
    fn test_resilience_error_site() {
        let err = ResilienceError::RetriesExhausted {
            site: "price-fetch".into(),
            attempts: 3,
            last: SourceError::Upstream { status: 502 },
        };
        assert_eq!(err.site(), "price-fetch");
        assert!(!err.is_breaker_open());
        assert!(err.to_string().contains("3 attempts"));
    }
}
