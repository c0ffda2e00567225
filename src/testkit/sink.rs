//! Recording [`AlertSink`] for dispatch tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ChannelId;
use crate::error::DeliveryError;
use crate::port::outbound::notifier::AlertSink;

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub channel: ChannelId,
    pub text: String,
}

/// Captures every message it is asked to deliver.
///
/// Channels registered with [`RecordingSink::failing_for`] reject delivery
/// with a transport error; those attempts are not recorded.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Delivered>>,
    failing: Mutex<HashSet<ChannelId>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(self, channel: impl Into<ChannelId>) -> Self {
        self.failing.lock().insert(channel.into());
        self
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn to_channel(&self, channel: &str) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .filter(|d| d.channel.as_str() == channel)
            .map(|d| d.text.clone())
            .collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn deliver(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError> {
        if self.failing.lock().contains(channel) {
            return Err(DeliveryError::Transport(format!(
                "scripted failure for {}",
                channel.redacted()
            )));
        }
        self.delivered.lock().push(Delivered {
            channel: channel.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
