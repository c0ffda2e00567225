//! Sentiment source configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Settings for [`BaselineSentimentSource`](super::BaselineSentimentSource).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// How long an aggregated sample is reused, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Half-width of the uniform noise added to each platform reading.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Per-symbol baseline score in `[-100, 100]`. Unlisted symbols use 0.
    #[serde(default = "default_baselines")]
    pub baselines: HashMap<String, f64>,
}

const fn default_enabled() -> bool {
    true
}

const fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

const fn default_jitter() -> f64 {
    15.0
}

fn default_baselines() -> HashMap<String, f64> {
    [
        ("UST", -60.0),
        ("USDD", -30.0),
        ("DAI", 10.0),
        ("USDC", 20.0),
        ("USDT", 0.0),
    ]
    .into_iter()
    .map(|(symbol, score)| (symbol.to_string(), score))
    .collect()
}

impl SentimentConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cache_ttl_secs: default_cache_ttl_secs(),
            jitter: default_jitter(),
            baselines: default_baselines(),
        }
    }
}
