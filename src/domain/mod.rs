//! Source-agnostic domain types and pure classification logic.

mod asset;
mod breaker;
mod cooldown;
mod deviation;
mod id;
mod price;
mod risk;
mod sentiment;
mod snapshot;
mod tier;

pub mod catalog;

pub use asset::{AssetDefinition, PegMechanism};
pub use breaker::{BreakerSnapshot, BreakerState, DegradationLevel};
pub use cooldown::{CooldownKey, CooldownRecord};
pub use deviation::{classify, Deviation, DeviationStatus};
pub use id::{ChannelId, Symbol};
pub use price::{PriceLookup, PriceSample, Provenance};
pub use risk::{ContributingFactors, FactorValue, Horizon, RiskAssessment, RiskLevel};
pub use sentiment::SentimentSample;
pub use snapshot::AssetSnapshot;
pub use tier::{Channel, ChannelTier, TierPolicy};
