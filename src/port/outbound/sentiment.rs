//! Sentiment source port.

use async_trait::async_trait;

use crate::domain::{SentimentSample, Symbol};
use crate::error::SourceError;

/// Provider of aggregated social sentiment.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Sentiment for `symbol`, or `None` when the provider has nothing for it.
    async fn analyze(&self, symbol: &Symbol) -> Result<Option<SentimentSample>, SourceError>;
}
