//! Social sentiment samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Symbol;

/// Aggregated sentiment for one asset.
///
/// `score` ranges from -100 (very negative) to +100; `fear_greed` from
/// 0 (extreme fear) to 100 (extreme greed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSample {
    pub symbol: Symbol,
    pub score: f64,
    pub mention_count: u64,
    pub engagement_score: f64,
    pub fear_greed: f64,
    pub observed_at: DateTime<Utc>,
}

impl SentimentSample {
    /// Create a sample, clamping `score` and `fear_greed` into range.
    #[must_use]
    pub fn new(
        symbol: impl Into<Symbol>,
        score: f64,
        mention_count: u64,
        engagement_score: f64,
        fear_greed: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            score: score.clamp(-100.0, 100.0),
            mention_count,
            engagement_score,
            fear_greed: fear_greed.clamp(0.0, 100.0),
            observed_at: Utc::now(),
        }
    }

    /// Map a sentiment score onto the 0-100 fear/greed scale.
    #[must_use]
    pub fn fear_greed_from_score(score: f64) -> f64 {
        ((score + 100.0) / 2.0).clamp(0.0, 100.0)
    }
}
