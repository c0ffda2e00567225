//! Retry policy: which failures to retry and how long to wait between attempts.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{SourceError, SourceErrorKind};

/// Backoff curve between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long and try again.
    Retry(Duration),
    /// Give up; the error is not retryable.
    Stop,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    1_000
}

const fn default_max_delay_ms() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_rate_limit_multiplier() -> f64 {
    3.0
}

const fn default_rate_limit_max_delay_ms() -> u64 {
    60_000
}

fn default_retry_on() -> Vec<SourceErrorKind> {
    vec![
        SourceErrorKind::Timeout,
        SourceErrorKind::Connection,
        SourceErrorKind::Upstream,
        SourceErrorKind::RateLimited,
    ]
}

fn default_stop_on() -> Vec<SourceErrorKind> {
    vec![SourceErrorKind::Invalid, SourceErrorKind::Malformed]
}

/// Retry configuration for upstream calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub strategy: RetryStrategy,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Growth factor for exponential backoff (default: 2.0).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Extra backoff factor applied to rate-limit failures (default: 3.0).
    #[serde(default = "default_rate_limit_multiplier")]
    pub rate_limit_multiplier: f64,
    /// Ceiling on any rate-limit wait, `Retry-After` hints included
    /// (default: 60000).
    #[serde(default = "default_rate_limit_max_delay_ms")]
    pub rate_limit_max_delay_ms: u64,
    /// Error kinds that are retried.
    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<SourceErrorKind>,
    /// Error kinds that fail immediately. Takes precedence over `retry_on`.
    #[serde(default = "default_stop_on")]
    pub stop_on: Vec<SourceErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            rate_limit_multiplier: default_rate_limit_multiplier(),
            rate_limit_max_delay_ms: default_rate_limit_max_delay_ms(),
            retry_on: default_retry_on(),
            stop_on: default_stop_on(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based), ignoring error kind.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64;
        let max = self.max_delay_ms as f64;
        let millis = match self.strategy {
            RetryStrategy::Fixed => base,
            RetryStrategy::Linear => (base * f64::from(attempt.saturating_add(1))).min(max),
            RetryStrategy::Exponential => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                (base * self.multiplier.powi(exponent)).min(max)
            }
        };
        duration_from_millis(millis)
    }

    /// Longest wait allowed after a rate-limit failure.
    #[must_use]
    pub const fn rate_limit_ceiling(&self) -> Duration {
        Duration::from_millis(self.rate_limit_max_delay_ms)
    }

    /// True when `kind` may be retried at all.
    #[must_use]
    pub fn is_retryable(&self, kind: SourceErrorKind) -> bool {
        !self.stop_on.contains(&kind) && self.retry_on.contains(&kind)
    }

    /// Decide what to do after `error` on attempt `attempt` (0-based).
    #[must_use]
    pub fn decide(&self, error: &SourceError, attempt: u32) -> RetryDecision {
        if attempt.saturating_add(1) >= self.max_attempts || !self.is_retryable(error.kind()) {
            return RetryDecision::Stop;
        }

        let backoff = self.backoff(attempt);
        match error {
            SourceError::RateLimited { retry_after } => {
                let stretched =
                    duration_from_millis(backoff.as_millis() as f64 * self.rate_limit_multiplier);
                let wanted = retry_after.map_or(stretched, |hint| hint.max(stretched));
                RetryDecision::Retry(wanted.min(self.rate_limit_ceiling()))
            }
            _ => RetryDecision::Retry(backoff),
        }
    }
}

fn duration_from_millis(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_millis(millis.min(u64::MAX as f64) as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(strategy: RetryStrategy) -> RetryPolicy {
        RetryPolicy {
            strategy,
            max_attempts: 10,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_fixed_backoff() {
        let p = policy(RetryStrategy::Fixed);
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(5), Duration::from_secs(1));
    }

    #[test]
    fn test_linear_backoff_caps() {
        let p = policy(RetryStrategy::Linear);
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(2), Duration::from_secs(3));
        assert_eq!(p.backoff(20), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_caps() {
        let p = policy(RetryStrategy::Exponential);
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(3), Duration::from_secs(8));
        assert_eq!(p.backoff(4), Duration::from_secs(10));
    }

    #[test]
    fn test_stop_on_wins() {
        let mut p = RetryPolicy::default();
        p.retry_on.push(SourceErrorKind::Invalid);
        let err = SourceError::Invalid("bad id".into());
        assert_eq!(p.decide(&err, 0), RetryDecision::Stop);
    }

    #[test]
    fn test_unlisted_kind_not_retried() {
        let p = RetryPolicy {
            retry_on: vec![SourceErrorKind::Timeout],
            stop_on: vec![],
            ..RetryPolicy::default()
        };
        let err = SourceError::Connection("reset".into());
        assert_eq!(p.decide(&err, 0), RetryDecision::Stop);
    }

    #[test]
    fn test_last_attempt_stops() {
        let p = RetryPolicy::default();
        let err = SourceError::Upstream { status: 503 };
        assert!(matches!(p.decide(&err, 1), RetryDecision::Retry(_)));
        assert_eq!(p.decide(&err, 2), RetryDecision::Stop);
    }

    #[test]
    fn test_rate_limit_stretches_and_honours_hint() {
        let p = RetryPolicy::default();
        let err = SourceError::RateLimited { retry_after: None };
        assert_eq!(p.decide(&err, 0), RetryDecision::Retry(Duration::from_secs(3)));

        let hinted = SourceError::RateLimited {
            retry_after: Some(Duration::from_secs(20)),
        };
        assert_eq!(
            p.decide(&hinted, 0),
            RetryDecision::Retry(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_rate_limit_wait_is_capped() {
        let p = RetryPolicy::default();
        let day = SourceError::RateLimited {
            retry_after: Some(Duration::from_secs(86_400)),
        };
        assert_eq!(p.decide(&day, 0), RetryDecision::Retry(Duration::from_secs(60)));

        let tight = RetryPolicy {
            rate_limit_max_delay_ms: 2_000,
            ..RetryPolicy::default()
        };
        let unhinted = SourceError::RateLimited { retry_after: None };
        assert_eq!(tight.decide(&unhinted, 0), RetryDecision::Retry(Duration::from_secs(2)));
    }
}
