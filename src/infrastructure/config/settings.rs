//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; secrets and channel ids come
//! from the environment (a `.env` file is loaded first by the binary):
//!
//! | variable             | effect                                  |
//! |----------------------|-----------------------------------------|
//! | `TELEGRAM_BOT_TOKEN` | Telegram bot token                      |
//! | `COINGECKO_API_KEY`  | sent as the CoinGecko demo API key      |
//! | `ALERT_CHANNEL_ID`   | adds a free-tier channel                |
//! | `PREMIUM_CHANNEL_ID` | adds a premium-tier channel             |
//!
//! # Example
//!
//! ```no_run
//! use pegwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use super::alerting::AlertingConfig;
use super::logging::LoggingConfig;
use super::state::StateConfig;
use super::telegram::TelegramAppConfig;
use crate::adapter::outbound::coingecko::CoinGeckoConfig;
use crate::adapter::outbound::sentiment::SentimentConfig;
use crate::application::monitor::MonitorConfig;
use crate::application::resilience::ResilienceConfig;
use crate::domain::{catalog, AssetDefinition, ChannelTier};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Every section is optional; an empty file yields a working monitor over
/// the built-in asset catalog that logs alerts instead of sending them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Price source settings.
    #[serde(default)]
    pub price_source: CoinGeckoConfig,

    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Breakers, retry, timeouts and fallback cache.
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Tier policies and delivery channels.
    #[serde(default)]
    pub alerting: AlertingConfig,

    #[serde(default)]
    pub telegram: TelegramAppConfig,

    #[serde(default)]
    pub state: StateConfig,

    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub assets: Vec<AssetDefinition>,
}

impl Config {
    /// Parse and validate configuration from TOML content.
    ///
    /// The environment is not consulted; see [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill secrets and extra channels from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(key) = non_empty("COINGECKO_API_KEY") {
            self.price_source.api_key = Some(key);
        }
        if let Some(id) = non_empty("ALERT_CHANNEL_ID") {
            self.alerting.add_channel(&id, ChannelTier::Free);
        }
        if let Some(id) = non_empty("PREMIUM_CHANNEL_ID") {
            self.alerting.add_channel(&id, ChannelTier::Premium);
        }
    }

    /// Assets to monitor: the configured list, or the built-in catalog.
    ///
    /// Inactive entries are included; the scheduler skips them.
    #[must_use]
    pub fn assets(&self) -> Vec<AssetDefinition> {
        if self.assets.is_empty() {
            catalog::all()
        } else {
            self.assets.clone()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.validate_assets()?;

        if self.monitor.interval_secs == 0 {
            return Err(invalid("monitor.interval_secs", "must be greater than 0"));
        }
        if self.monitor.max_concurrency == 0 {
            return Err(invalid("monitor.max_concurrency", "must be greater than 0"));
        }

        let url = Url::parse(&self.price_source.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "price_source.base_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(
                "price_source.base_url",
                "scheme must be http or https",
            ));
        }
        if self.price_source.timeout_secs == 0 {
            return Err(invalid("price_source.timeout_secs", "must be greater than 0"));
        }

        let resilience = &self.resilience;
        if resilience.breaker.failure_threshold == 0 {
            return Err(invalid(
                "resilience.breaker.failure_threshold",
                "must be greater than 0",
            ));
        }
        if resilience.timeout_secs == 0 {
            return Err(invalid("resilience.timeout_secs", "must be greater than 0"));
        }
        if resilience.retry.max_attempts == 0 {
            return Err(invalid(
                "resilience.retry.max_attempts",
                "must be at least 1",
            ));
        }
        if resilience.retry.max_delay_ms < resilience.retry.base_delay_ms {
            return Err(invalid(
                "resilience.retry.max_delay_ms",
                "must be >= base_delay_ms",
            ));
        }
        if !resilience.retry.multiplier.is_finite() || resilience.retry.multiplier < 1.0 {
            return Err(invalid("resilience.retry.multiplier", "must be >= 1.0"));
        }

        if !self.sentiment.jitter.is_finite() || self.sentiment.jitter < 0.0 {
            return Err(invalid("sentiment.jitter", "must be a non-negative number"));
        }

        self.alerting.validate()?;
        Ok(())
    }

    fn validate_assets(&self) -> Result<()> {
        let assets = self.assets();
        if !assets.iter().any(|a| a.active) {
            return Err(invalid("assets", "at least one active asset is required"));
        }

        let mut seen = HashSet::new();
        for asset in &assets {
            if asset.symbol.as_str().is_empty() || asset.source_id.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "assets.symbol/source_id",
                }
                .into());
            }
            if !seen.insert(asset.symbol.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: "assets",
                    reason: format!("duplicate symbol {}", asset.symbol),
                }
                .into());
            }
            if asset.tier == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "assets.tier",
                    reason: format!("{} tier must be 1 or greater", asset.symbol),
                }
                .into());
            }
            if asset.target <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "assets.target",
                    reason: format!("{} target must be greater than 0", asset.symbol),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Horizon;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(!config.telegram.enabled);
        assert_eq!(config.assets().len(), catalog::all().len());
    }

    #[test]
    fn test_sections_parse() {
        let config = Config::parse_toml(
            r#"
            [monitor]
            interval_secs = 30
            horizon = "1h"

            [resilience]
            timeout_secs = 10

            [resilience.breaker]
            failure_threshold = 3

            [[assets]]
            symbol = "USDC"
            name = "USD Coin"
            source_id = "usd-coin"
            tier = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.interval_secs, 30);
        assert_eq!(config.monitor.horizon, Horizon::OneHour);
        assert_eq!(config.resilience.breaker.failure_threshold, 3);
        assert_eq!(config.resilience.breaker.recovery_timeout_secs, 60);
        assert_eq!(config.assets().len(), 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::parse_toml("[monitor]\ninterval_secs = 0").unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_bad_url_scheme_rejected() {
        let err = Config::parse_toml("[price_source]\nbase_url = \"ftp://example.com\"").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_all_inactive_assets_rejected() {
        let err = Config::parse_toml(
            r#"
            [[assets]]
            symbol = "UST"
            name = "TerraUSD"
            source_id = "terrausd"
            tier = 2
            active = false
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("assets"));
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let err = Config::parse_toml(
            r#"
            [[assets]]
            symbol = "USDC"
            name = "USD Coin"
            source_id = "usd-coin"
            tier = 1

            [[assets]]
            symbol = "USDC"
            name = "Other"
            source_id = "other"
            tier = 1
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("COINGECKO_API_KEY", "cg-key"),
            ("ALERT_CHANNEL_ID", "-100111"),
            ("PREMIUM_CHANNEL_ID", "@premium_feed"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| (*v).to_string()));
        config.validate().unwrap();

        assert!(config.telegram.token_present());
        assert_eq!(config.price_source.api_key.as_deref(), Some("cg-key"));
        let channels = config.alerting.channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].tier, ChannelTier::Free);
        assert_eq!(channels[1].tier, ChannelTier::Premium);
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert!(!config.telegram.token_present());
        assert!(config.alerting.channels().is_empty());
    }
}
