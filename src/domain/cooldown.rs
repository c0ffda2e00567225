//! Alert suppression records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ChannelId, Symbol};
use super::tier::ChannelTier;

/// Identity of a suppression window: one per (asset, channel, tier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CooldownKey {
    pub symbol: Symbol,
    pub channel_id: ChannelId,
    pub tier: ChannelTier,
}

impl CooldownKey {
    #[must_use]
    pub fn new(symbol: Symbol, channel_id: ChannelId, tier: ChannelTier) -> Self {
        Self {
            symbol,
            channel_id,
            tier,
        }
    }
}

/// When a key last alerted and how long it stays quiet.
///
/// `suppressed_until` is never earlier than `last_alert_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub symbol: Symbol,
    pub channel_id: ChannelId,
    pub tier: ChannelTier,
    pub last_alert_at: DateTime<Utc>,
    pub suppressed_until: DateTime<Utc>,
}

impl CooldownRecord {
    #[must_use]
    pub fn key(&self) -> CooldownKey {
        CooldownKey::new(self.symbol.clone(), self.channel_id.clone(), self.tier)
    }

    #[must_use]
    pub fn is_suppressed(&self, now: DateTime<Utc>) -> bool {
        now < self.suppressed_until
    }
}
