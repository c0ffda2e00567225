//! Monitor loop settings.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::Horizon;

const fn default_interval_secs() -> u64 {
    60
}

const fn default_max_concurrency() -> usize {
    8
}

const fn default_history_days() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

/// Monitor configuration (`[monitor]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between cycles (default: 60).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Maximum per-asset evaluations in flight (default: 8).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Days of price history fetched for risk scoring (default: 1).
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    /// Risk prediction horizon (default: 24h).
    #[serde(default)]
    pub horizon: Horizon,
    /// Derive the degradation level from breaker states after each cycle.
    #[serde(default = "default_true")]
    pub auto_degradation: bool,
}

impl MonitorConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrency: default_max_concurrency(),
            history_days: default_history_days(),
            horizon: Horizon::default(),
            auto_degradation: default_true(),
        }
    }
}
