//! Baseline sentiment source.
//!
//! There is no social-media integration: each platform reading is the
//! configured per-symbol baseline plus uniform noise. Two platforms are
//! aggregated, the primary weighted 0.7 and the secondary 0.3, where the
//! secondary reads more conservatively (`primary * 0.8 - 5`). Aggregates are
//! cached per symbol for the configured TTL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

use super::settings::SentimentConfig;
use crate::domain::{SentimentSample, Symbol};
use crate::error::SourceError;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::sentiment::SentimentSource;

const PRIMARY_WEIGHT: f64 = 0.7;
const SECONDARY_WEIGHT: f64 = 0.3;

pub struct BaselineSentimentSource {
    config: SentimentConfig,
    clock: Arc<dyn Clock>,
    cache: DashMap<Symbol, (SentimentSample, DateTime<Utc>)>,
}

impl BaselineSentimentSource {
    #[must_use]
    pub fn new(config: SentimentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            cache: DashMap::new(),
        }
    }

    fn cached(&self, symbol: &Symbol, now: DateTime<Utc>) -> Option<SentimentSample> {
        let entry = self.cache.get(symbol)?;
        let (sample, stored_at) = entry.value();
        let age = now.signed_duration_since(*stored_at).to_std().ok()?;
        (age < self.config.cache_ttl()).then(|| sample.clone())
    }

    fn primary_reading(&self, symbol: &Symbol) -> f64 {
        let base = self
            .config
            .baselines
            .get(symbol.as_str())
            .copied()
            .unwrap_or(0.0);
        let jitter = self.config.jitter.abs();
        let noise = if jitter > 0.0 {
            rand::thread_rng().gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        (base + noise).clamp(-100.0, 100.0)
    }

    fn secondary_reading(&self, symbol: &Symbol) -> f64 {
        (self.primary_reading(symbol) * 0.8 - 5.0).clamp(-100.0, 100.0)
    }

    fn aggregate(&self, symbol: &Symbol, now: DateTime<Utc>) -> SentimentSample {
        let score = self.primary_reading(symbol) * PRIMARY_WEIGHT
            + self.secondary_reading(symbol) * SECONDARY_WEIGHT;
        let mut sample = SentimentSample::new(
            symbol.clone(),
            score,
            0,
            0.0,
            SentimentSample::fear_greed_from_score(score),
        );
        sample.observed_at = now;
        sample
    }
}

#[async_trait]
impl SentimentSource for BaselineSentimentSource {
    async fn analyze(&self, symbol: &Symbol) -> Result<Option<SentimentSample>, SourceError> {
        if !self.config.enabled {
            return Ok(None);
        }

        let now = self.clock.now();
        if let Some(sample) = self.cached(symbol, now) {
            return Ok(Some(sample));
        }

        let sample = self.aggregate(symbol, now);
        debug!(symbol = %symbol, score = sample.score, "Computed baseline sentiment");
        self.cache.insert(symbol.clone(), (sample.clone(), now));
        Ok(Some(sample))
    }
}
