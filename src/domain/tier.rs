//! Audience tiers and the channels that belong to them.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ChannelId;

/// Subscription tier of an alert channel, ordered by privilege.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChannelTier {
    Free,
    Premium,
    Enterprise,
}

impl ChannelTier {
    pub const ALL: [Self; 3] = [Self::Free, Self::Premium, Self::Enterprise];

    /// Highest asset tier this channel may see.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Free => 1,
            Self::Premium => 2,
            Self::Enterprise => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }

    /// True when an asset of `asset_tier` is visible to this channel.
    #[must_use]
    pub const fn can_see(self, asset_tier: u8) -> bool {
        asset_tier <= self.rank()
    }
}

impl fmt::Display for ChannelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert sensitivity and suppression window for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    /// Minimum absolute deviation, in percent, that triggers an alert.
    pub threshold_percent: Decimal,
    /// Suppression window after an alert.
    pub cooldown: Duration,
}

/// An alert destination and the tier it is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub tier: ChannelTier,
}

impl Channel {
    pub fn new(id: impl Into<ChannelId>, tier: ChannelTier) -> Self {
        Self {
            id: id.into(),
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_membership() {
        assert!(ChannelTier::Free.can_see(1));
        assert!(!ChannelTier::Free.can_see(2));
        assert!(ChannelTier::Premium.can_see(2));
        assert!(ChannelTier::Enterprise.can_see(3));
        assert!(ChannelTier::Free < ChannelTier::Enterprise);
    }
}
