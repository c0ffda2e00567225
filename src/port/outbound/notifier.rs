//! Alert sink port.
//!
//! The dispatch controller renders one text message per decision and hands it
//! to an [`AlertSink`] together with the destination channel.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ChannelId;
use crate::error::DeliveryError;

/// Outbound notification transport.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver `text` to `channel`.
    async fn deliver(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError>;

    /// Short sink name for logs.
    fn name(&self) -> &'static str;
}

/// A no-op sink for dry runs or when no transport is configured.
pub struct NullSink;

#[async_trait]
impl AlertSink for NullSink {
    async fn deliver(&self, _channel: &ChannelId, _text: &str) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// A sink that writes alerts to the log.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError> {
        let headline = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
        info!(
            channel = %channel.redacted(),
            chars = text.chars().count(),
            headline = %headline,
            "Alert"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
