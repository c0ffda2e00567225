//! Price observations.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::Symbol;

/// Where a price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched from the price source in this cycle.
    Live,
    /// Served from the last-known-good cache after a failed fetch.
    Fallback { age: Duration },
}

impl Provenance {
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// A single price observation for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub symbol: Symbol,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
    pub provenance: Provenance,
}

impl PriceSample {
    #[must_use]
    pub fn live(symbol: Symbol, price: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            price,
            observed_at,
            provenance: Provenance::Live,
        }
    }
}

/// Result of looking up one asset in a batch price response.
///
/// A price the source did not return is `Missing`, never substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    Available(PriceSample),
    Missing { symbol: Symbol, source_id: String },
}

impl PriceLookup {
    #[must_use]
    pub fn sample(&self) -> Option<&PriceSample> {
        match self {
            Self::Available(sample) => Some(sample),
            Self::Missing { .. } => None,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Available(sample) => &sample.symbol,
            Self::Missing { symbol, .. } => symbol,
        }
    }
}
