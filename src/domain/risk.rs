//! Risk assessment types.
//!
//! A [`RiskAssessment`] is produced fresh for every evaluation and never
//! mutated afterwards; all fields are private with read accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Symbol;

/// Categorical risk band for a 0-100 score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a score: `<=25` low, `<=50` medium, `<=75` high, else critical.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 25.0 {
            Self::Low
        } else if score <= 50.0 {
            Self::Medium
        } else if score <= 75.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🟠",
            Self::Critical => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction horizon for a risk assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
}

impl Horizon {
    /// Scaling applied to the trend sub-score.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::OneHour => 0.3,
            Self::SixHours => 0.7,
            Self::OneDay => 1.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::OneDay => "24h",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value attributed to a contributing factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Weight(f64),
    Note(String),
}

impl fmt::Display for FactorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight(w) => write!(f, "{w:.1}"),
            Self::Note(note) => f.write_str(note),
        }
    }
}

/// Insertion-ordered factor attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactors(Vec<(String, FactorValue)>);

impl ContributingFactors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_weight(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.0.push((name.into(), FactorValue::Weight(weight)));
        self
    }

    #[must_use]
    pub fn with_note(mut self, name: impl Into<String>, note: impl Into<String>) -> Self {
        self.0.push((name.into(), FactorValue::Note(note.into())));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FactorValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Numeric weight of a factor, if present and numeric.
    #[must_use]
    pub fn weight(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            FactorValue::Weight(w) => Some(*w),
            FactorValue::Note(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactorValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Composite depeg risk for one asset at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    symbol: Symbol,
    risk_score: f64,
    risk_level: RiskLevel,
    confidence: f64,
    horizon: Horizon,
    factors: ContributingFactors,
    sentiment_score: Option<f64>,
    computed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Build an assessment. Score and confidence are clamped to `[0, 100]`
    /// and the level is derived from the clamped score.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        risk_score: f64,
        confidence: f64,
        horizon: Horizon,
        factors: ContributingFactors,
        sentiment_score: Option<f64>,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let risk_score = risk_score.clamp(0.0, 100.0);
        Self {
            symbol,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            confidence: confidence.clamp(0.0, 100.0),
            horizon,
            factors,
            sentiment_score,
            computed_at,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    #[must_use]
    pub const fn risk_score(&self) -> f64 {
        self.risk_score
    }

    #[must_use]
    pub const fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        self.horizon
    }

    #[must_use]
    pub fn factors(&self) -> &ContributingFactors {
        &self.factors
    }

    /// Sentiment sub-score, present only when a sentiment sample was used.
    #[must_use]
    pub const fn sentiment_score(&self) -> Option<f64> {
        self.sentiment_score
    }

    #[must_use]
    pub const fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// True when the engine fell back to its conservative default.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.factors.get("error").is_some()
    }
}
