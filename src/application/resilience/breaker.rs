//! Per call-site circuit breakers.
//!
//! A breaker trips to `Open` after `failure_threshold` consecutive failures and
//! rejects every call until `recovery_timeout` has elapsed since the last
//! failure. The next caller then becomes the single half-open trial: its
//! outcome closes the breaker or re-opens it with a fresh timestamp.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{BreakerSnapshot, BreakerState};
use crate::port::outbound::clock::Clock;

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_recovery_timeout_secs() -> u64 {
    60
}

/// Circuit breaker thresholds, shared by every call-site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker (default: 5).
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds after the last failure before a trial call is allowed (default: 60).
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
}

impl BreakerConfig {
    #[must_use]
    pub const fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failure_count: u32,
    last_failure_at: Option<DateTime<Utc>>,
    trial_in_flight: bool,
}

/// Circuit breaker guarding one call-site.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure_at: None,
                trial_in_flight: false,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Ask for permission to make one call.
    ///
    /// Returns `None` when the call must be rejected without touching the
    /// upstream. The returned permit must be settled with
    /// [`BreakerPermit::succeed`] or [`BreakerPermit::fail`]; dropping an
    /// unsettled trial permit frees the trial slot without changing state.
    pub fn try_acquire(self: &Arc<Self>) -> Option<BreakerPermit> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let trial = match inner.state {
            BreakerState::Closed => false,
            BreakerState::Open => {
                let recovered = inner.last_failure_at.map_or(true, |at| {
                    recovery_deadline(at, self.config.recovery_timeout())
                        .is_some_and(|until| now >= until)
                });
                if !recovered {
                    return None;
                }
                inner.state = BreakerState::HalfOpen;
                inner.trial_in_flight = true;
                info!(breaker = %self.name, "Circuit breaker half-open, allowing trial call");
                true
            }
            BreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    return None;
                }
                inner.trial_in_flight = true;
                true
            }
        };

        Some(BreakerPermit {
            breaker: Arc::clone(self),
            trial,
            settled: false,
        })
    }

    /// Only the trial call may close a tripped breaker. A success from a
    /// permit granted before the breaker tripped is ignored.
    fn on_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        if !trial && inner.state != BreakerState::Closed {
            debug!(breaker = %self.name, state = %inner.state, "Ignoring late success from pre-trip call");
            return;
        }
        if inner.state != BreakerState::Closed {
            info!(breaker = %self.name, "Circuit breaker closed");
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        inner.trial_in_flight = false;
    }

    fn on_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);

        match inner.state {
            BreakerState::Closed => {
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.last_failure_at = Some(now);
                    warn!(
                        breaker = %self.name,
                        failures = inner.failure_count,
                        recovery_secs = self.config.recovery_timeout_secs,
                        "Circuit breaker tripped"
                    );
                } else {
                    inner.last_failure_at = Some(now);
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.last_failure_at = Some(now);
                inner.trial_in_flight = false;
                warn!(breaker = %self.name, "Trial call failed, circuit breaker re-opened");
            }
            BreakerState::Open => {
                inner.last_failure_at = Some(now);
            }
        }
    }

    fn release_trial(&self) {
        self.inner.lock().trial_in_flight = false;
    }

    /// Copy of the current state for health reporting and persistence.
    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_at: inner.last_failure_at,
        }
    }

    /// Restore persisted state. A persisted half-open breaker comes back
    /// open so the recovery timeout is honoured again.
    pub fn restore(&self, snapshot: &BreakerSnapshot) {
        let mut inner = self.inner.lock();
        inner.state = match snapshot.state {
            BreakerState::HalfOpen => BreakerState::Open,
            other => other,
        };
        inner.failure_count = snapshot.failure_count;
        inner.last_failure_at = snapshot.last_failure_at;
        inner.trial_in_flight = false;
    }
}

/// Permission for one call through a [`CircuitBreaker`].
#[must_use = "a permit must be settled with succeed() or fail()"]
pub struct BreakerPermit {
    breaker: Arc<CircuitBreaker>,
    trial: bool,
    settled: bool,
}

impl BreakerPermit {
    /// True when this call is the half-open trial.
    #[must_use]
    pub const fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure();
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.release_trial();
        }
    }
}

/// Lazily-populated set of breakers keyed by call-site name.
pub struct BreakerRegistry {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            breakers: DashMap::new(),
        }
    }

    /// Breaker for `site`, created closed on first use.
    pub fn get(&self, site: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(site) {
            return Arc::clone(existing.value());
        }
        let entry = self.breakers.entry(site.to_string()).or_insert_with(|| {
            Arc::new(CircuitBreaker::new(site, self.config, Arc::clone(&self.clock)))
        });
        Arc::clone(entry.value())
    }

    /// State of `site`, `Closed` if it has never been used.
    #[must_use]
    pub fn state(&self, site: &str) -> BreakerState {
        self.breakers
            .get(site)
            .map_or(BreakerState::Closed, |b| b.state())
    }

    /// Snapshots of every breaker, sorted by name.
    #[must_use]
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self.breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn restore(&self, snapshots: &[BreakerSnapshot]) {
        for snapshot in snapshots {
            self.get(&snapshot.name).restore(snapshot);
        }
    }
}

fn recovery_deadline(last_failure: DateTime<Utc>, timeout: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(timeout)
        .ok()
        .and_then(|d| last_failure.checked_add_signed(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::clock::ManualClock;

    fn breaker(clock: &Arc<ManualClock>) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(
            "price-fetch",
            BreakerConfig::default(),
            Arc::clone(clock) as Arc<dyn Clock>,
        ))
    }

    fn fail_n(b: &Arc<CircuitBreaker>, n: u32) {
        for _ in 0..n {
            b.try_acquire().expect("permit").fail();
        }
    }

    #[test]
    fn test_trips_at_threshold() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);

        fail_n(&b, 4);
        assert_eq!(b.state(), BreakerState::Closed);
        fail_n(&b, 1);
        assert_eq!(b.state(), BreakerState::Open);
        assert!(b.try_acquire().is_none());
    }

    #[test]
    fn test_success_resets_count() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);

        fail_n(&b, 4);
        b.try_acquire().expect("permit").succeed();
        fail_n(&b, 4);
        assert_eq!(b.state(), BreakerState::Closed);
        assert_eq!(b.snapshot().failure_count, 4);
    }

    #[test]
    fn test_late_success_does_not_close_open_breaker() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);

        let slow = b.try_acquire().expect("permit while closed");
        fail_n(&b, 5);
        assert_eq!(b.state(), BreakerState::Open);

        slow.succeed();
        assert_eq!(b.state(), BreakerState::Open);
        assert_eq!(b.snapshot().failure_count, 5);
        assert!(b.try_acquire().is_none());
    }

    #[test]
    fn test_late_success_does_not_settle_trial() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);

        let slow = b.try_acquire().expect("permit while closed");
        fail_n(&b, 5);
        clock.advance(Duration::from_secs(60));
        let trial = b.try_acquire().expect("trial permit");

        slow.succeed();
        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert!(b.try_acquire().is_none(), "trial still in flight");

        trial.fail();
        assert_eq!(b.state(), BreakerState::Open);
    }

    #[test]
    fn test_single_half_open_trial() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);
        fail_n(&b, 5);

        clock.advance(Duration::from_secs(59));
        assert!(b.try_acquire().is_none());

        clock.advance(Duration::from_secs(1));
        let trial = b.try_acquire().expect("trial permit");
        assert!(trial.is_trial());
        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert!(b.try_acquire().is_none());

        trial.succeed();
        assert_eq!(b.state(), BreakerState::Closed);
        assert_eq!(b.snapshot().failure_count, 0);
    }

    #[test]
    fn test_failed_trial_reopens() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);
        fail_n(&b, 5);

        clock.advance(Duration::from_secs(60));
        b.try_acquire().expect("trial permit").fail();
        assert_eq!(b.state(), BreakerState::Open);
        assert_eq!(b.snapshot().last_failure_at, Some(clock.now()));

        clock.advance(Duration::from_secs(30));
        assert!(b.try_acquire().is_none());
    }

    #[test]
    fn test_dropped_trial_frees_slot() {
        let clock = Arc::new(ManualClock::default());
        let b = breaker(&clock);
        fail_n(&b, 5);
        clock.advance(Duration::from_secs(60));

        drop(b.try_acquire().expect("trial permit"));
        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert!(b.try_acquire().is_some());
    }

    #[test]
    fn test_registry_snapshots_and_restore() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let registry = BreakerRegistry::new(BreakerConfig::default(), Arc::clone(&clock));
        assert_eq!(registry.state("sentiment-fetch"), BreakerState::Closed);

        let b = registry.get("sentiment-fetch");
        for _ in 0..5 {
            b.try_acquire().expect("permit").fail();
        }
        registry.get("price-fetch");

        let snapshots = registry.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name, "price-fetch");
        assert_eq!(snapshots[1].state, BreakerState::Open);

        let restored = BreakerRegistry::new(BreakerConfig::default(), clock);
        restored.restore(&snapshots);
        assert_eq!(restored.state("sentiment-fetch"), BreakerState::Open);
    }
}
