//! Heuristic depeg risk engine.
//!
//! Combines four sub-scores into one explainable assessment:
//!
//! | factor                | weight | source                                  |
//! |-----------------------|--------|-----------------------------------------|
//! | `time_series_pattern` | 0.4    | price deviation, long-window volatility, recent trend |
//! | `social_sentiment`    | 0.3    | sentiment score, mentions, fear/greed   |
//! | `price_volatility`    | 0.2    | recent vs. historical volatility ratio  |
//! | `peer_correlation`    | 0.1    | static peer class of the symbol         |
//!
//! [`RiskEngine::assess`] never fails: any invalid input or non-finite
//! intermediate result produces the conservative fallback assessment.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use super::stats;
use crate::domain::{ContributingFactors, Horizon, RiskAssessment, SentimentSample, Symbol};
use crate::port::outbound::clock::Clock;

const TREND_WEIGHT: f64 = 0.4;
const SENTIMENT_WEIGHT: f64 = 0.3;
const VOLATILITY_WEIGHT: f64 = 0.2;
const PEER_WEIGHT: f64 = 0.1;

/// Trend sub-score when there are fewer than two prices.
const NEUTRAL_TREND: f64 = 50.0;
/// Sentiment sub-score when no sample is available.
const NEUTRAL_SENTIMENT: f64 = 25.0;
/// Volatility sub-score when there are fewer than [`MIN_VOLATILITY_PRICES`].
const NEUTRAL_VOLATILITY: f64 = 50.0;
const MIN_VOLATILITY_PRICES: usize = 10;

const SHORT_WINDOW: usize = 60;
const LONG_WINDOW: usize = 1440;
const TREND_WINDOW: usize = 10;
const SPIKE_WINDOW: usize = 10;

const FALLBACK_SCORE: f64 = 75.0;
const FALLBACK_CONFIDENCE: f64 = 10.0;

/// Why an assessment fell back to the conservative default.
#[derive(Debug, Error)]
enum AssessmentError {
    #[error("price history contains a non-finite or non-positive value at index {0}")]
    InvalidPrice(usize),
    #[error("volume is not finite")]
    InvalidVolume,
    #[error("target price must be finite and positive")]
    InvalidTarget,
    #[error("sentiment sample contains non-finite values")]
    InvalidSentiment,
    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),
}

/// Inputs for one assessment.
#[derive(Debug, Clone, Copy)]
pub struct RiskInput<'a> {
    pub symbol: &'a Symbol,
    /// Oldest-first price history.
    pub history: &'a [f64],
    pub volume: f64,
    pub sentiment: Option<&'a SentimentSample>,
    /// Peg target the last price is compared against.
    pub target: f64,
}

impl<'a> RiskInput<'a> {
    /// Input with no volume, no sentiment and a 1.0 target.
    #[must_use]
    pub fn new(symbol: &'a Symbol, history: &'a [f64]) -> Self {
        Self {
            symbol,
            history,
            volume: 0.0,
            sentiment: None,
            target: 1.0,
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Option<&'a SentimentSample>) -> Self {
        self.sentiment = sentiment;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = target;
        self
    }
}

/// The four sub-scores before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SubScores {
    trend: f64,
    sentiment: f64,
    volatility: f64,
    peer: f64,
}

impl SubScores {
    fn combined(&self) -> f64 {
        self.trend * TREND_WEIGHT
            + self.sentiment * SENTIMENT_WEIGHT
            + self.volatility * VOLATILITY_WEIGHT
            + self.peer * PEER_WEIGHT
    }

    fn confidence(&self) -> f64 {
        let spread = stats::std_dev(&[self.trend, self.sentiment, self.volatility, self.peer]);
        (100.0 - 2.0 * spread).max(10.0).clamp(0.0, 100.0)
    }
}

/// Stateless risk scorer.
#[derive(Clone)]
pub struct RiskEngine {
    clock: Arc<dyn Clock>,
}

impl RiskEngine {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Assess one asset. Never panics and never fails.
    #[must_use]
    pub fn assess(&self, input: RiskInput<'_>, horizon: Horizon) -> RiskAssessment {
        let now = self.clock.now();
        match Self::score(&input, horizon) {
            Ok(scores) => {
                let confidence = scores.confidence();
                let factors = ContributingFactors::new()
                    .with_weight("time_series_pattern", scores.trend)
                    .with_weight("social_sentiment", scores.sentiment)
                    .with_weight("price_volatility", scores.volatility)
                    .with_weight("peer_correlation", scores.peer)
                    .with_weight("data_quality_score", confidence);
                RiskAssessment::new(
                    input.symbol.clone(),
                    scores.combined(),
                    confidence,
                    horizon,
                    factors,
                    input.sentiment.map(|_| scores.sentiment),
                    now,
                )
            }
            Err(e) => {
                error!(symbol = %input.symbol, error = %e, "Risk assessment failed, using fallback");
                RiskAssessment::new(
                    input.symbol.clone(),
                    FALLBACK_SCORE,
                    FALLBACK_CONFIDENCE,
                    horizon,
                    ContributingFactors::new().with_note("error", e.to_string()),
                    None,
                    now,
                )
            }
        }
    }

    /// Assess several assets, one result per input in order.
    #[must_use]
    pub fn assess_batch(&self, inputs: &[RiskInput<'_>], horizon: Horizon) -> Vec<RiskAssessment> {
        inputs.iter().map(|input| self.assess(*input, horizon)).collect()
    }

    fn score(input: &RiskInput<'_>, horizon: Horizon) -> Result<SubScores, AssessmentError> {
        validate(input)?;

        let returns = stats::returns(input.history);
        let scores = SubScores {
            trend: finite("trend", trend_score(input.history, &returns, input.target, horizon))?,
            sentiment: finite("sentiment", sentiment_score(input.sentiment))?,
            volatility: finite("volatility", volatility_score(input.history, &returns))?,
            peer: peer_score(input.symbol),
        };
        finite("combined score", scores.combined())?;
        finite("confidence", scores.confidence())?;

        debug!(
            symbol = %input.symbol,
            points = input.history.len(),
            short_volatility = stats::std_dev(stats::tail(&returns, SHORT_WINDOW)),
            trend = scores.trend,
            sentiment = scores.sentiment,
            volatility = scores.volatility,
            peer = scores.peer,
            "Risk sub-scores"
        );

        Ok(scores)
    }
}

fn validate(input: &RiskInput<'_>) -> Result<(), AssessmentError> {
    if let Some(index) = input
        .history
        .iter()
        .position(|p| !p.is_finite() || *p <= 0.0)
    {
        return Err(AssessmentError::InvalidPrice(index));
    }
    if !input.volume.is_finite() {
        return Err(AssessmentError::InvalidVolume);
    }
    if !input.target.is_finite() || input.target <= 0.0 {
        return Err(AssessmentError::InvalidTarget);
    }
    if let Some(s) = input.sentiment {
        if !(s.score.is_finite() && s.engagement_score.is_finite() && s.fear_greed.is_finite()) {
            return Err(AssessmentError::InvalidSentiment);
        }
    }
    Ok(())
}

fn finite(stage: &'static str, value: f64) -> Result<f64, AssessmentError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AssessmentError::NonFinite(stage))
    }
}

fn trend_score(prices: &[f64], returns: &[f64], target: f64, horizon: Horizon) -> f64 {
    let Some(last) = prices.last().filter(|_| prices.len() >= 2) else {
        return NEUTRAL_TREND;
    };

    let long_volatility = stats::std_dev(stats::tail(returns, LONG_WINDOW));
    let recent_trend = if returns.len() >= TREND_WINDOW {
        stats::mean(stats::tail(returns, TREND_WINDOW))
    } else {
        0.0
    };

    let price_risk = ((last - target).abs() * 100.0).min(100.0);
    let volatility_risk = (long_volatility * 1000.0).min(100.0);
    let trend_risk = recent_trend.abs() * 500.0;

    ((price_risk * 0.5 + volatility_risk * 0.3 + trend_risk * 0.2) * horizon.multiplier())
        .clamp(0.0, 100.0)
}

fn sentiment_score(sentiment: Option<&SentimentSample>) -> f64 {
    let Some(s) = sentiment else {
        return NEUTRAL_SENTIMENT;
    };

    let mut risk = (-s.score).max(0.0);
    if s.score < -20.0 && s.mention_count > 100 {
        risk *= 1.5;
    }
    if s.fear_greed < 25.0 {
        risk += 20.0;
    }
    risk.clamp(0.0, 100.0)
}

fn volatility_score(prices: &[f64], returns: &[f64]) -> f64 {
    if prices.len() < MIN_VOLATILITY_PRICES {
        return NEUTRAL_VOLATILITY;
    }

    let recent = stats::std_dev(stats::tail(returns, SPIKE_WINDOW));
    let historical = if returns.len() > 2 * SPIKE_WINDOW {
        stats::std_dev(&returns[..returns.len() - SPIKE_WINDOW])
    } else {
        recent
    };

    (recent / (historical + 1e-8) * 30.0).clamp(0.0, 100.0)
}

fn peer_score(symbol: &Symbol) -> f64 {
    match symbol.as_str() {
        // Algorithmic designs.
        "UST" | "USDD" | "MIM" => 60.0,
        // Crypto-collateralised.
        "DAI" | "FRAX" | "LUSD" => 30.0,
        _ => 15.0,
    }
}
