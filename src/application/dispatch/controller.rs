//! Tier- and cooldown-gated alert dispatch.
//!
//! Once per cycle the scheduler hands the controller every asset snapshot.
//! For each (snapshot, channel) pair the controller applies three gates in
//! order:
//!
//! 1. **Threshold**: `|deviation| >= tier threshold`
//! 2. **Membership**: the asset's tier is visible to the channel's tier
//! 3. **Cooldown**: the (asset, channel, tier) key is not suppressed
//!
//! A pair passing all three is claimed in the [`CooldownStore`] and emitted as
//! exactly one [`DispatchDecision`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use super::cooldown::CooldownStore;
use super::message::{render_alert, truncate};
use crate::domain::{
    AssetSnapshot, Channel, ChannelId, ChannelTier, CooldownKey, Symbol, TierPolicy,
};
use crate::error::{ConfigError, DeliveryError};
use crate::port::outbound::notifier::AlertSink;

/// Threshold and cooldown for each channel tier.
///
/// Thresholds must strictly decrease from free to enterprise so that a more
/// privileged tier always hears about a deviation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicies {
    free: TierPolicy,
    premium: TierPolicy,
    enterprise: TierPolicy,
}

impl TierPolicies {
    /// Build and validate a policy set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a threshold is not positive
    /// or thresholds do not strictly decrease by tier.
    pub fn new(
        free: TierPolicy,
        premium: TierPolicy,
        enterprise: TierPolicy,
    ) -> Result<Self, ConfigError> {
        if enterprise.threshold_percent <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "alerting.tiers",
                reason: "thresholds must be greater than 0".to_string(),
            });
        }
        if !(free.threshold_percent > premium.threshold_percent
            && premium.threshold_percent > enterprise.threshold_percent)
        {
            return Err(ConfigError::InvalidValue {
                field: "alerting.tiers",
                reason: format!(
                    "thresholds must strictly decrease by tier (free {}% > premium {}% > enterprise {}%)",
                    free.threshold_percent, premium.threshold_percent, enterprise.threshold_percent
                ),
            });
        }
        Ok(Self {
            free,
            premium,
            enterprise,
        })
    }

    #[must_use]
    pub const fn get(&self, tier: ChannelTier) -> &TierPolicy {
        match tier {
            ChannelTier::Free => &self.free,
            ChannelTier::Premium => &self.premium,
            ChannelTier::Enterprise => &self.enterprise,
        }
    }
}

impl Default for TierPolicies {
    fn default() -> Self {
        Self {
            free: TierPolicy {
                threshold_percent: dec!(0.5),
                cooldown: Duration::from_secs(30 * 60),
            },
            premium: TierPolicy {
                threshold_percent: dec!(0.2),
                cooldown: Duration::from_secs(5 * 60),
            },
            enterprise: TierPolicy {
                threshold_percent: dec!(0.1),
                cooldown: Duration::from_secs(60),
            },
        }
    }
}

/// What triggered a decision, plus the rest of the cycle for rendering.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub trigger: AssetSnapshot,
    pub cycle: Arc<[AssetSnapshot]>,
    pub decided_at: DateTime<Utc>,
}

/// One alert to send to one channel.
#[derive(Debug, Clone)]
pub struct DispatchDecision {
    pub symbol: Symbol,
    pub channel_id: ChannelId,
    pub tier: ChannelTier,
    pub context: AlertContext,
}

impl DispatchDecision {
    /// Message text for this decision, capped at the transport limit.
    #[must_use]
    pub fn render(&self) -> String {
        truncate(&render_alert(
            &self.context.trigger,
            &self.context.cycle,
            self.tier,
            self.context.decided_at,
        ))
    }
}

/// Outcome of delivering a batch of decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Decides which (asset, channel) pairs alert each cycle and delivers them.
pub struct DispatchController {
    policies: TierPolicies,
    channels: Vec<Channel>,
    cooldowns: Arc<CooldownStore>,
}

impl DispatchController {
    pub fn new(policies: TierPolicies, channels: Vec<Channel>, cooldowns: Arc<CooldownStore>) -> Self {
        Self {
            policies,
            channels,
            cooldowns,
        }
    }

    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn cooldowns(&self) -> &Arc<CooldownStore> {
        &self.cooldowns
    }

    /// Evaluate every gate for every (snapshot, channel) pair.
    ///
    /// Claimed keys are written to the cooldown store before this returns, so
    /// a decision is emitted at most once per suppression window even if
    /// delivery later fails.
    pub fn evaluate_cycle(
        &self,
        snapshots: &[AssetSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<DispatchDecision> {
        let cycle: Arc<[AssetSnapshot]> = snapshots.into();
        let mut decisions = Vec::new();

        for snapshot in snapshots {
            let deviation = snapshot.deviation.abs_percent();
            for channel in &self.channels {
                let policy = self.policies.get(channel.tier);
                if deviation < policy.threshold_percent {
                    continue;
                }
                if !channel.tier.can_see(snapshot.asset.tier) {
                    continue;
                }

                let key = CooldownKey::new(
                    snapshot.asset.symbol.clone(),
                    channel.id.clone(),
                    channel.tier,
                );
                if !self.cooldowns.try_claim(&key, now, policy.cooldown) {
                    debug!(
                        symbol = %key.symbol,
                        channel = %channel.id.redacted(),
                        tier = %channel.tier,
                        "Alert suppressed by cooldown"
                    );
                    continue;
                }

                info!(
                    symbol = %key.symbol,
                    tier = %channel.tier,
                    deviation = %snapshot.deviation.percent(),
                    status = %snapshot.deviation.status(),
                    "Alert eligible"
                );
                decisions.push(DispatchDecision {
                    symbol: key.symbol,
                    channel_id: key.channel_id,
                    tier: key.tier,
                    context: AlertContext {
                        trigger: snapshot.clone(),
                        cycle: Arc::clone(&cycle),
                        decided_at: now,
                    },
                });
            }
        }

        decisions
    }

    /// Render and deliver each decision through `sink`.
    ///
    /// Failures are logged and counted; the cooldown already claimed for a
    /// failed decision stays in place.
    pub async fn deliver(&self, decisions: &[DispatchDecision], sink: &dyn AlertSink) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for decision in decisions {
            let text = decision.render();
            let result = if text.trim().is_empty() {
                Err(DeliveryError::EmptyMessage)
            } else {
                sink.deliver(&decision.channel_id, &text).await
            };

            match result {
                Ok(()) => {
                    report.delivered += 1;
                    info!(
                        symbol = %decision.symbol,
                        channel = %decision.channel_id.redacted(),
                        tier = %decision.tier,
                        sink = sink.name(),
                        "Alert delivered"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        symbol = %decision.symbol,
                        channel = %decision.channel_id.redacted(),
                        tier = %decision.tier,
                        error = %e,
                        "Alert delivery failed"
                    );
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(threshold: Decimal) -> TierPolicy {
        TierPolicy {
            threshold_percent: threshold,
            cooldown: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_thresholds_must_strictly_decrease() {
        assert!(TierPolicies::new(policy(dec!(0.5)), policy(dec!(0.2)), policy(dec!(0.1))).is_ok());
        assert!(TierPolicies::new(policy(dec!(0.5)), policy(dec!(0.5)), policy(dec!(0.1))).is_err());
        assert!(TierPolicies::new(policy(dec!(0.2)), policy(dec!(0.5)), policy(dec!(0.1))).is_err());
        assert!(TierPolicies::new(policy(dec!(0.5)), policy(dec!(0.2)), policy(dec!(0))).is_err());
    }

    #[test]
    fn test_default_policies() {
        let p = TierPolicies::default();
        assert_eq!(p.get(ChannelTier::Free).threshold_percent, dec!(0.5));
        assert_eq!(p.get(ChannelTier::Premium).cooldown, Duration::from_secs(300));
        assert_eq!(p.get(ChannelTier::Enterprise).threshold_percent, dec!(0.1));
    }
}
