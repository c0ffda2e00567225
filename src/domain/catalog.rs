//! Built-in catalog of monitored stablecoins.
//!
//! Tier 1 assets are visible to every channel; tier 2 assets only to premium
//! and enterprise channels. Used when the config file does not list `[[assets]]`.

use super::asset::{AssetDefinition, PegMechanism};

/// Largest stablecoins, tracked for every tier.
#[must_use]
pub fn tier_one() -> Vec<AssetDefinition> {
    use PegMechanism::*;
    vec![
        AssetDefinition::new("USDT", "Tether", "tether", Centralized, 1),
        AssetDefinition::new("USDC", "USD Coin", "usd-coin", Centralized, 1),
        AssetDefinition::new("DAI", "Dai", "dai", Decentralized, 1),
        AssetDefinition::new("USDS", "USDS", "usds", Decentralized, 1),
    ]
}

/// Premium-only stablecoins.
#[must_use]
pub fn tier_two() -> Vec<AssetDefinition> {
    use PegMechanism::*;
    vec![
        AssetDefinition::new("FRAX", "Frax", "frax", Hybrid, 2),
        AssetDefinition::new("TUSD", "TrueUSD", "true-usd", Centralized, 2),
        AssetDefinition::new("USDP", "Pax Dollar", "paxos-standard", Centralized, 2),
        AssetDefinition::new("PYUSD", "PayPal USD", "paypal-usd", Centralized, 2),
        AssetDefinition::new("BUSD", "Binance USD", "binance-usd", FiatBacked, 2),
        AssetDefinition::new("LUSD", "Liquity USD", "liquity-usd", CryptoBacked, 2),
        AssetDefinition::new("MIM", "Magic Internet Money", "magic-internet-money", CryptoBacked, 2),
        AssetDefinition::new("GHO", "GHO", "gho", CryptoBacked, 2),
        AssetDefinition::new("DOLA", "Dola USD", "dola-usd", CryptoBacked, 2),
        AssetDefinition::new("USDe", "Ethena USDe", "ethena-usde", CryptoBacked, 2),
        AssetDefinition::new("sUSD", "sUSD", "susd", CryptoBacked, 2),
        AssetDefinition::new("USDD", "USDD", "usdd", Algorithmic, 2),
        AssetDefinition::new("GUSD", "Gemini Dollar", "gemini-dollar", Centralized, 2),
        AssetDefinition::new("FDUSD", "First Digital USD", "first-digital-usd", Centralized, 2),
        AssetDefinition::new("CRVUSD", "Curve.Fi USD", "crvusd", Decentralized, 2),
        AssetDefinition::new("USD+", "USD Plus", "usd-plus", CryptoBacked, 2),
        AssetDefinition::new("MAI", "MAI", "mimatic", CryptoBacked, 2),
        AssetDefinition::new("USDbC", "USD Base Coin", "bridged-usdc-base", StableBacked, 2),
        AssetDefinition::new("eUSD", "Electronic USD", "electronic-usd", CryptoBacked, 2),
        AssetDefinition::new("axlUSDC", "Axelar USDC", "axlusdc", CryptoBacked, 2),
        AssetDefinition::new("HONEY", "Berachain HONEY", "honey", CryptoBacked, 2),
        AssetDefinition::new("NECT", "Berachain NECT", "nect", CryptoBacked, 2),
        // Quoted in USD by the price source, so a 1.0 target is meaningless.
        AssetDefinition::new("EURS", "STASIS EURS", "stasis-eurs", EurPegged, 2).inactive(),
        AssetDefinition::new("EURC", "Circle EUR Coin", "euro-coin", EurPegged, 2).inactive(),
        // Collapsed in 2022; kept for reference only.
        AssetDefinition::new("UST", "TerraClassicUSD", "terrausd", Algorithmic, 2).inactive(),
    ]
}

/// Every catalogued asset, tier 1 first.
#[must_use]
pub fn all() -> Vec<AssetDefinition> {
    let mut assets = tier_one();
    assets.extend(tier_two());
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_symbols_are_unique() {
        let assets = all();
        let symbols: HashSet<_> = assets.iter().map(|a| a.symbol.clone()).collect();
        assert_eq!(symbols.len(), assets.len());
    }

    #[test]
    fn test_tiers() {
        assert!(tier_one().iter().all(|a| a.tier == 1));
        assert!(tier_two().iter().all(|a| a.tier == 2));
    }

    #[test]
    fn test_eur_pegged_are_inactive() {
        assert!(all()
            .iter()
            .filter(|a| a.mechanism == PegMechanism::EurPegged)
            .all(|a| !a.active));
    }
}
