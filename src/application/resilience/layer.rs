//! The resilience layer wrapped around every upstream call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::breaker::{BreakerConfig, BreakerRegistry};
use super::degradation::DegradationState;
use super::fallback::FallbackCache;
use super::retry::{RetryDecision, RetryPolicy};
use crate::domain::{BreakerSnapshot, DegradationLevel};
use crate::error::{ResilienceError, SourceError};
use crate::port::outbound::clock::Clock;

/// Names of the protected call-sites.
pub mod site {
    pub const PRICE_FETCH: &str = "price-fetch";
    pub const PRICE_HISTORY: &str = "price-history";
    pub const SENTIMENT_FETCH: &str = "sentiment-fetch";
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_fallback_max_age_secs() -> u64 {
    300
}

/// Resilience settings (`[resilience]` in the config file).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResilienceConfig {
    #[serde(default)]
    pub breaker: BreakerConfig,
    /// Per-attempt timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Oldest cached price served after a failed fetch, in seconds (default: 300).
    #[serde(default = "default_fallback_max_age_secs")]
    pub fallback_max_age_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Operator-set minimum degradation level. When set it also overrides
    /// any floor restored from persisted state.
    #[serde(default)]
    pub degradation: Option<DegradationLevel>,
}

impl ResilienceConfig {
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn fallback_max_age(&self) -> Duration {
        Duration::from_secs(self.fallback_max_age_secs)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            breaker: BreakerConfig::default(),
            timeout_secs: default_timeout_secs(),
            fallback_max_age_secs: default_fallback_max_age_secs(),
            retry: RetryPolicy::default(),
            degradation: None,
        }
    }
}

/// Breakers, retry, per-attempt timeout, fallback prices and the degradation
/// level, owned together and shared by the scheduler's tasks.
pub struct ResilienceLayer {
    config: ResilienceConfig,
    breakers: BreakerRegistry,
    degradation: DegradationState,
    prices: FallbackCache<Decimal>,
}

impl ResilienceLayer {
    pub fn new(config: ResilienceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: BreakerRegistry::new(config.breaker, Arc::clone(&clock)),
            prices: FallbackCache::new(clock),
            degradation: DegradationState::new(config.degradation.unwrap_or_default()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    /// Run `op` under the breaker for `site`, retrying per policy.
    ///
    /// The breaker is consulted before every attempt and every failed
    /// attempt (including timeouts) counts against it.
    pub async fn call<T, F, Fut>(&self, site: &str, mut op: F) -> Result<T, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let breaker = self.breakers.get(site);
        let policy = &self.config.retry;
        let attempt_timeout = self.config.attempt_timeout();
        let mut attempt: u32 = 0;

        loop {
            let Some(permit) = breaker.try_acquire() else {
                debug!(site = %site, "Call rejected by open circuit breaker");
                return Err(ResilienceError::BreakerOpen {
                    site: site.to_string(),
                });
            };

            let outcome = match timeout(attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout {
                    after: attempt_timeout,
                }),
            };

            let err = match outcome {
                Ok(value) => {
                    permit.succeed();
                    return Ok(value);
                }
                Err(err) => {
                    permit.fail();
                    err
                }
            };

            match policy.decide(&err, attempt) {
                RetryDecision::Retry(delay) => {
                    if let SourceError::RateLimited { retry_after } = &err {
                        warn!(
                            site = %site,
                            attempt = attempt + 1,
                            retry_after_ms = retry_after.map(|hint| hint.as_millis() as u64),
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited by upstream, backing off"
                        );
                    } else {
                        warn!(
                            site = %site,
                            attempt = attempt + 1,
                            max_attempts = policy.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Attempt failed, retrying"
                        );
                    }
                    sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Stop if policy.is_retryable(err.kind()) => {
                    error!(site = %site, attempts = attempt + 1, error = %err, "All retry attempts failed");
                    return Err(ResilienceError::RetriesExhausted {
                        site: site.to_string(),
                        attempts: attempt + 1,
                        last: err,
                    });
                }
                RetryDecision::Stop => {
                    error!(site = %site, kind = err.kind().as_str(), error = %err, "Non-retryable failure");
                    return Err(ResilienceError::Rejected {
                        site: site.to_string(),
                        cause: err,
                    });
                }
            }
        }
    }

    /// Cache a successfully fetched price.
    pub fn remember_price(&self, source_id: &str, price: Decimal) {
        self.prices.put(source_id, price);
    }

    /// Cached price for `source_id` within the configured max age.
    #[must_use]
    pub fn fallback_price(&self, source_id: &str) -> Option<(Decimal, Duration)> {
        self.prices.get(source_id, self.config.fallback_max_age())
    }

    #[must_use]
    pub fn degradation(&self) -> DegradationLevel {
        self.degradation.level()
    }

    /// Operator-set minimum level, independent of breaker states.
    #[must_use]
    pub fn degradation_floor(&self) -> DegradationLevel {
        self.degradation.floor()
    }

    /// Set the operator floor. The effective level never drops below it.
    pub fn set_degradation(&self, level: DegradationLevel) {
        self.degradation.set(level);
    }

    /// Reinstate a persisted floor unless the config pins one.
    pub fn restore_degradation_floor(&self, level: DegradationLevel) {
        match self.config.degradation {
            Some(configured) if configured != level => {
                info!(configured = %configured, persisted = %level, "Configured degradation floor overrides persisted one");
            }
            Some(_) => {}
            None => self.degradation.set(level),
        }
    }

    /// Re-derive the degradation level from breaker states.
    pub fn apply_degradation_policy(&self) -> DegradationLevel {
        self.degradation.apply_policy(&self.breakers)
    }

    #[must_use]
    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    #[must_use]
    pub fn breaker_snapshots(&self) -> Vec<BreakerSnapshot> {
        self.breakers.snapshots()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::domain::BreakerState;
    use crate::error::SourceErrorKind;
    use crate::port::outbound::clock::SystemClock;

    fn layer(retry: RetryPolicy) -> ResilienceLayer {
        ResilienceLayer::new(
            ResilienceConfig {
                retry,
                ..ResilienceConfig::default()
            },
            Arc::new(SystemClock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let layer = layer(RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = layer
            .call(site::PRICE_FETCH, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SourceError::Upstream { status: 502 })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(layer.breakers().state(site::PRICE_FETCH), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries() {
        let layer = layer(RetryPolicy::default());
        let result: Result<(), _> = layer
            .call(site::PRICE_HISTORY, || async {
                Err(SourceError::Connection("refused".into()))
            })
            .await;

        match result {
            Err(ResilienceError::RetriesExhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.kind(), SourceErrorKind::Connection);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(layer.breaker_snapshots()[0].failure_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_kind_is_rejected_immediately() {
        let layer = layer(RetryPolicy::default());
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = layer
            .call(site::PRICE_FETCH, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SourceError::Malformed("not json".into())) }
            })
            .await;

        assert!(matches!(result, Err(ResilienceError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_failure() {
        let layer = layer(RetryPolicy::no_retry());
        let result: Result<(), _> = layer
            .call(site::SENTIMENT_FETCH, || async {
                sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        match result {
            Err(ResilienceError::RetriesExhausted { last, .. }) => {
                assert_eq!(last, SourceError::Timeout { after: Duration::from_secs(30) });
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(layer.breaker_snapshots()[0].failure_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_retry_after_does_not_stall_call() {
        let layer = layer(RetryPolicy::default());
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = layer
            .call(site::PRICE_FETCH, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(SourceError::RateLimited {
                            retry_after: Some(Duration::from_secs(86_400)),
                        })
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(60) && waited < Duration::from_secs(61), "{waited:?}");
    }

    #[tokio::test]
    async fn test_open_breaker_skips_upstream() {
        let layer = layer(RetryPolicy::no_retry());
        let calls = AtomicU32::new(0);
        for _ in 0..6 {
            let _: Result<(), _> = layer
                .call(site::PRICE_FETCH, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(SourceError::Upstream { status: 500 }) }
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(layer.apply_degradation_policy(), DegradationLevel::Minimal);
    }

    #[test]
    fn test_config_defaults_from_toml() {
        let config: ResilienceConfig = toml::from_str(
            r#"
            [breaker]
            failure_threshold = 3
            [retry]
            strategy = "linear"
            stop_on = ["invalid"]
            "#,
        )
        .unwrap();
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.recovery_timeout_secs, 60);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.retry.stop_on, vec![SourceErrorKind::Invalid]);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.degradation, None);
    }

    #[test]
    fn test_configured_floor_wins_over_persisted() {
        let config: ResilienceConfig = toml::from_str(r#"degradation = "reduced""#).unwrap();
        let pinned = ResilienceLayer::new(config, Arc::new(SystemClock));
        assert_eq!(pinned.degradation(), DegradationLevel::Reduced);
        pinned.restore_degradation_floor(DegradationLevel::Emergency);
        assert_eq!(pinned.degradation_floor(), DegradationLevel::Reduced);

        let free = layer(RetryPolicy::default());
        free.restore_degradation_floor(DegradationLevel::Emergency);
        assert_eq!(free.degradation(), DegradationLevel::Emergency);
    }
}
