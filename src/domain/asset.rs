//! Tracked asset reference data.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::Symbol;

const fn default_true() -> bool {
    true
}

fn default_target() -> Decimal {
    Decimal::ONE
}

/// How an asset maintains its peg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PegMechanism {
    #[default]
    Centralized,
    FiatBacked,
    Decentralized,
    Hybrid,
    CryptoBacked,
    StableBacked,
    Algorithmic,
    EurPegged,
}

impl PegMechanism {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Centralized => "centralized",
            Self::FiatBacked => "fiat-backed",
            Self::Decentralized => "decentralized",
            Self::Hybrid => "hybrid",
            Self::CryptoBacked => "crypto-backed",
            Self::StableBacked => "stable-backed",
            Self::Algorithmic => "algorithmic",
            Self::EurPegged => "eur-pegged",
        }
    }
}

impl fmt::Display for PegMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of a monitored pegged asset.
///
/// `tier` is the access tier: an asset of tier `n` is only visible to
/// channels whose tier rank is at least `n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub symbol: Symbol,
    pub name: String,
    /// Identifier used by the price source (e.g. a CoinGecko coin id).
    #[serde(alias = "coingecko_id")]
    pub source_id: String,
    pub tier: u8,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Peg target in the quote currency.
    #[serde(default = "default_target")]
    pub target: Decimal,
    #[serde(default)]
    pub mechanism: PegMechanism,
}

impl AssetDefinition {
    /// Create an active dollar-pegged asset definition.
    pub fn new(
        symbol: impl Into<Symbol>,
        name: impl Into<String>,
        source_id: impl Into<String>,
        mechanism: PegMechanism,
        tier: u8,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            source_id: source_id.into(),
            tier,
            active: true,
            target: Decimal::ONE,
            mechanism,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: Decimal) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_defaults_to_active_dollar_peg() {
        let asset = AssetDefinition::new("USDC", "USD Coin", "usd-coin", PegMechanism::Centralized, 1);
        assert!(asset.active);
        assert_eq!(asset.target, dec!(1));
        assert_eq!(asset.symbol.as_str(), "USDC");
    }

    #[test]
    fn test_deserialize_with_coingecko_alias() {
        let asset: AssetDefinition = toml::from_str(
            r#"
            symbol = "FRAX"
            name = "Frax"
            coingecko_id = "frax"
            tier = 2
            mechanism = "hybrid"
            "#,
        )
        .unwrap();

        assert_eq!(asset.source_id, "frax");
        assert_eq!(asset.mechanism, PegMechanism::Hybrid);
        assert!(asset.active);
        assert_eq!(asset.target, Decimal::ONE);
    }
}
