//! CoinGecko response bodies.

use std::collections::HashMap;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

/// `/simple/price` body: `{"tether": {"usd": 1.0002}, ...}`.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct SimplePriceResponse(pub HashMap<String, HashMap<String, f64>>);

impl SimplePriceResponse {
    /// USD prices keyed by coin id. Ids without a finite USD quote are left out.
    #[must_use]
    pub fn usd_prices(self, precision: u32) -> HashMap<String, Decimal> {
        self.0
            .into_iter()
            .filter_map(|(id, quotes)| {
                let usd = *quotes.get("usd")?;
                let price = Decimal::from_f64(usd)?.round_dp(precision);
                Some((id, price))
            })
            .collect()
    }
}

/// `/coins/{id}/market_chart` body. Each price point is `[timestamp_ms, price]`.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}

impl MarketChartResponse {
    /// Prices oldest first.
    #[must_use]
    pub fn into_prices(self) -> Vec<f64> {
        let mut points = self.prices;
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.into_iter().map(|(_, price)| price).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_simple_price_parsing() {
        let json = r#"{"tether": {"usd": 1.0002}, "usd-coin": {"usd": 0.9998}, "dai": {}}"#;
        let body: SimplePriceResponse = serde_json::from_str(json).unwrap();
        let prices = body.usd_prices(4);

        assert_eq!(prices.len(), 2);
        assert_eq!(prices["tether"], dec!(1.0002));
        assert_eq!(prices["usd-coin"], dec!(0.9998));
        assert!(!prices.contains_key("dai"));
    }

    #[test]
    fn test_market_chart_sorted_by_time() {
        let json = r#"{"prices": [[2000, 1.01], [1000, 1.0], [3000, 0.99]], "total_volumes": []}"#;
        let body: MarketChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.into_prices(), vec![1.0, 1.01, 0.99]);
    }

    #[test]
    fn test_market_chart_missing_prices() {
        let body: MarketChartResponse = serde_json::from_str("{}").unwrap();
        assert!(body.into_prices().is_empty());
    }
}
