//! Telegram implementation of [`AlertSink`].

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, info};

use crate::domain::ChannelId;
use crate::error::DeliveryError;
use crate::port::outbound::notifier::AlertSink;

/// Sends alerts as plain-text Telegram messages.
///
/// Alerts contain `$`, `+`, `(` and other characters that MarkdownV2 would
/// require escaping, so no parse mode is set.
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    #[must_use]
    pub fn new(bot_token: &str) -> Self {
        info!("Telegram alert sink ready");
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

/// Map a channel id onto a Telegram recipient.
///
/// `@name` addresses a public channel by username; anything else must be a
/// numeric chat id.
///
/// # Errors
///
/// Returns [`DeliveryError::InvalidChannel`] for ids of neither form.
pub fn recipient_for(channel: &ChannelId) -> Result<Recipient, DeliveryError> {
    let raw = channel.as_str();
    if raw.starts_with('@') && raw.len() > 1 {
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    raw.parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| DeliveryError::InvalidChannel(channel.redacted()))
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn deliver(&self, channel: &ChannelId, text: &str) -> Result<(), DeliveryError> {
        if text.trim().is_empty() {
            return Err(DeliveryError::EmptyMessage);
        }
        let recipient = recipient_for(channel)?;
        self.bot
            .send_message(recipient, text)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        debug!(channel = %channel.redacted(), "Telegram message sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_channel() {
        let recipient = recipient_for(&ChannelId::from("-1001234567890")).unwrap();
        assert_eq!(recipient, Recipient::Id(ChatId(-1_001_234_567_890)));
    }

    #[test]
    fn test_username_channel() {
        let recipient = recipient_for(&ChannelId::from("@depeg_alerts")).unwrap();
        assert_eq!(
            recipient,
            Recipient::ChannelUsername("@depeg_alerts".to_string())
        );
    }

    #[test]
    fn test_malformed_channel() {
        let err = recipient_for(&ChannelId::from("depeg_alerts")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidChannel(_)));
        assert!(recipient_for(&ChannelId::from("@")).is_err());
    }

    #[tokio::test]
    async fn test_empty_message_refused_before_network() {
        let sink = TelegramSink::new("123:fake");
        let err = sink
            .deliver(&ChannelId::from("-100123"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::EmptyMessage));
    }
}
