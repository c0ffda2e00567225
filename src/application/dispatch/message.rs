//! Plain-text alert rendering.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::domain::{AssetSnapshot, ChannelTier};

/// Hard upper bound on message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;
const TRUNCATED_CHARS: usize = 4090;

/// Render the alert for `trigger` as seen by a `tier` channel.
///
/// The cycle listing only includes assets the tier may see, sorted by
/// absolute deviation, largest first.
#[must_use]
pub fn render_alert(
    trigger: &AssetSnapshot,
    cycle: &[AssetSnapshot],
    tier: ChannelTier,
    now: DateTime<Utc>,
) -> String {
    let mut msg = String::from("🚨 DEPEG ALERT\n\n");
    let _ = writeln!(msg, "{}", price_line(trigger));

    let risk = &trigger.risk;
    let _ = writeln!(
        msg,
        "{} Risk: {} ({:.0}/100, confidence {:.0}%)",
        risk.risk_level().emoji(),
        risk.risk_level().as_str().to_uppercase(),
        risk.risk_score(),
        risk.confidence()
    );

    let mut visible: Vec<&AssetSnapshot> = cycle
        .iter()
        .filter(|s| tier.can_see(s.asset.tier))
        .collect();
    visible.sort_by(|a, b| b.deviation.abs_percent().cmp(&a.deviation.abs_percent()));

    msg.push_str("\n📊 All Stablecoins:\n");
    for snapshot in visible {
        let _ = writeln!(msg, "{}", price_line(snapshot));
    }

    let _ = write!(msg, "\n🕐 {}", now.format("%H:%M UTC"));
    if let Some(footer) = tier_footer(tier) {
        let _ = write!(msg, "\n\n{footer}");
    }
    msg
}

fn price_line(snapshot: &AssetSnapshot) -> String {
    let fallback = if snapshot.sample.provenance.is_live() {
        ""
    } else {
        " (cached)"
    };
    format!(
        "{} {}: ${:.4} ({:+.2}%){}",
        snapshot.deviation.status().emoji(),
        snapshot.asset.symbol,
        snapshot.sample.price.round_dp(4),
        snapshot.deviation.percent_f64(),
        fallback
    )
}

const fn tier_footer(tier: ChannelTier) -> Option<&'static str> {
    match tier {
        ChannelTier::Free => None,
        ChannelTier::Premium => Some("💎 Premium Alert - Early Warning"),
        ChannelTier::Enterprise => Some("🏢 Enterprise Alert - Priority Feed"),
    }
}

/// Cap `text` at [`MAX_MESSAGE_CHARS`], marking truncation with `...`.
#[must_use]
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(TRUNCATED_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_limit() {
        let exact = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate(&exact), exact);

        let long = "é".repeat(MAX_MESSAGE_CHARS + 1);
        let out = truncate(&long);
        assert_eq!(out.chars().count(), TRUNCATED_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_footer_per_tier() {
        assert!(tier_footer(ChannelTier::Free).is_none());
        assert!(tier_footer(ChannelTier::Premium)
            .is_some_and(|f| f.contains("Early Warning")));
    }
}
