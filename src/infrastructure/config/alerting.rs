//! Alert tier and channel configuration.
//!
//! ```toml
//! [alerting.free]
//! threshold_percent = 0.5
//! cooldown_secs = 1800
//!
//! [[alerting.channels]]
//! id = "-1001234567890"
//! tier = "premium"
//! ```
//!
//! Unset tier fields fall back to the built-in defaults for that tier.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::dispatch::TierPolicies;
use crate::domain::{Channel, ChannelTier, TierPolicy};
use crate::error::ConfigError;

/// Partial override of one tier's policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TierPolicyConfig {
    #[serde(default)]
    pub threshold_percent: Option<Decimal>,
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
}

impl TierPolicyConfig {
    fn resolve(&self, fallback: &TierPolicy) -> TierPolicy {
        TierPolicy {
            threshold_percent: self.threshold_percent.unwrap_or(fallback.threshold_percent),
            cooldown: self
                .cooldown_secs
                .map_or(fallback.cooldown, Duration::from_secs),
        }
    }
}

/// One configured delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    pub tier: ChannelTier,
}

/// Alerting configuration (`[alerting]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertingConfig {
    #[serde(default)]
    pub free: TierPolicyConfig,
    #[serde(default)]
    pub premium: TierPolicyConfig,
    #[serde(default)]
    pub enterprise: TierPolicyConfig,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl AlertingConfig {
    /// Resolve and validate the tier policies.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when thresholds do not strictly
    /// decrease from free to enterprise.
    pub fn policies(&self) -> Result<TierPolicies, ConfigError> {
        let defaults = TierPolicies::default();
        TierPolicies::new(
            self.free.resolve(defaults.get(ChannelTier::Free)),
            self.premium.resolve(defaults.get(ChannelTier::Premium)),
            self.enterprise.resolve(defaults.get(ChannelTier::Enterprise)),
        )
    }

    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .map(|c| Channel::new(c.id.trim(), c.tier))
            .collect()
    }

    /// Add a channel unless one with the same id is already configured.
    pub fn add_channel(&mut self, id: &str, tier: ChannelTier) {
        let id = id.trim();
        if id.is_empty() || self.channels.iter().any(|c| c.id.trim() == id) {
            return;
        }
        self.channels.push(ChannelConfig {
            id: id.to_string(),
            tier,
        });
    }

    /// Reject malformed channel ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad id (redacted).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policies()?;
        for channel in self.channels() {
            if !channel.id.is_well_formed() {
                return Err(ConfigError::InvalidValue {
                    field: "alerting.channels",
                    reason: format!(
                        "channel id {} must be a numeric chat id or @username",
                        channel.id.redacted()
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_resolve() {
        let policies = AlertingConfig::default().policies().unwrap();
        assert_eq!(policies, TierPolicies::default());
    }

    #[test]
    fn test_partial_override_keeps_other_fields() {
        let config: AlertingConfig = toml::from_str(
            r#"
            [premium]
            threshold_percent = 0.3
            "#,
        )
        .unwrap();
        let policies = config.policies().unwrap();
        let premium = policies.get(ChannelTier::Premium);
        assert_eq!(premium.threshold_percent, dec!(0.3));
        assert_eq!(premium.cooldown, Duration::from_secs(300));
    }

    #[test]
    fn test_non_decreasing_thresholds_rejected() {
        let config: AlertingConfig = toml::from_str(
            r#"
            [premium]
            threshold_percent = 0.5
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.policies(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_add_channel_deduplicates() {
        let mut config = AlertingConfig::default();
        config.add_channel("-100123", ChannelTier::Free);
        config.add_channel(" -100123 ", ChannelTier::Premium);
        config.add_channel("", ChannelTier::Premium);
        assert_eq!(config.channels().len(), 1);
        assert_eq!(config.channels()[0].tier, ChannelTier::Free);
    }

    #[test]
    fn test_malformed_channel_rejected() {
        let mut config = AlertingConfig::default();
        config.add_channel("alerts", ChannelTier::Free);
        assert!(config.validate().is_err());
    }
}
