//! Telegram delivery configuration.

use serde::Deserialize;

/// Telegram configuration (`[telegram]`).
///
/// The bot token is never read from the file; it comes from
/// `TELEGRAM_BOT_TOKEN`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TelegramAppConfig {
    /// Deliver alerts through Telegram. When false, alerts are logged only.
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip)]
    pub bot_token: Option<String>,
}

impl TelegramAppConfig {
    #[must_use]
    pub fn token_present(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}
