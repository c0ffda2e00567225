//! Builders for domain values used across tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    classify, AssetDefinition, AssetSnapshot, Channel, ChannelTier, ContributingFactors,
    Horizon, PegMechanism, PriceSample, RiskAssessment, Symbol,
};

/// Active dollar-pegged asset whose source id is the lowercase symbol.
pub fn asset(symbol: &str, tier: u8) -> AssetDefinition {
    AssetDefinition::new(
        symbol,
        symbol,
        symbol.to_lowercase(),
        PegMechanism::Centralized,
        tier,
    )
}

pub fn channel(id: &str, tier: ChannelTier) -> Channel {
    Channel::new(id, tier)
}

/// A plain low-risk assessment.
pub fn risk(symbol: &str, score: f64) -> RiskAssessment {
    RiskAssessment::new(
        Symbol::from(symbol),
        score,
        80.0,
        Horizon::OneDay,
        ContributingFactors::new().with_weight("time_series_pattern", score),
        None,
        Utc::now(),
    )
}

/// Snapshot of `asset` at `price`, classified against its target.
pub fn snapshot(asset: AssetDefinition, price: Decimal, at: DateTime<Utc>) -> AssetSnapshot {
    let deviation = classify(price, asset.target);
    let sample = PriceSample::live(asset.symbol.clone(), price, at);
    let risk = risk(asset.symbol.as_str(), 20.0);
    AssetSnapshot::new(asset, sample, deviation, risk)
}
