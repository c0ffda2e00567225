//! Price source port.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::SourceError;

/// Upstream market data provider.
///
/// Identifiers are the provider's own ids (`AssetDefinition::source_id`).
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current prices for `ids`.
    ///
    /// Ids the provider does not know are absent from the map. Implementations
    /// must never fill them in with a default.
    async fn fetch_current(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError>;

    /// Historical prices for one id over the last `days`, oldest first.
    async fn fetch_history(&self, id: &str, days: u32) -> Result<Vec<f64>, SourceError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
