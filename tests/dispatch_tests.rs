//! Tier gating, cooldown windows and delivery accounting.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use pegwatch::application::dispatch::{CooldownStore, DispatchController, TierPolicies};
use pegwatch::domain::{AssetSnapshot, Channel, ChannelTier, DeviationStatus};
use pegwatch::testkit::clock::ManualClock;
use pegwatch::testkit::domain::{asset, channel, snapshot};
use pegwatch::testkit::sink::RecordingSink;

fn controller(channels: Vec<Channel>) -> DispatchController {
    DispatchController::new(
        TierPolicies::default(),
        channels,
        Arc::new(CooldownStore::new()),
    )
}

fn t0() -> DateTime<Utc> {
    ManualClock::default().now()
}

fn minutes(n: i64) -> chrono::Duration {
    chrono::Duration::minutes(n)
}

fn usdt_at(price: rust_decimal::Decimal, at: DateTime<Utc>) -> AssetSnapshot {
    snapshot(asset("USDT", 1), price, at)
}

#[test]
fn test_depeg_is_eligible_for_free_channel() {
    let snap = usdt_at(dec!(1.006), t0());
    assert_eq!(snap.deviation.percent(), dec!(0.6));
    assert_eq!(snap.deviation.status(), DeviationStatus::Depeg);

    let dispatch = controller(vec![channel("@free", ChannelTier::Free)]);
    let decisions = dispatch.evaluate_cycle(&[snap], t0());

    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].channel_id.as_str(), "@free");
    assert_eq!(decisions[0].tier, ChannelTier::Free);
}

#[test]
fn test_free_cooldown_suppresses_then_releases() {
    let dispatch = controller(vec![channel("@free", ChannelTier::Free)]);

    let first = dispatch.evaluate_cycle(&[usdt_at(dec!(1.006), t0())], t0());
    assert_eq!(first.len(), 1);

    let at_ten = t0() + minutes(10);
    let second = dispatch.evaluate_cycle(&[usdt_at(dec!(1.006), at_ten)], at_ten);
    assert!(second.is_empty(), "alert inside the 30 minute window must be suppressed");

    let at_thirty_one = t0() + minutes(31);
    let third = dispatch.evaluate_cycle(&[usdt_at(dec!(1.006), at_thirty_one)], at_thirty_one);
    assert_eq!(third.len(), 1);
}

#[test]
fn test_threshold_is_inclusive() {
    let dispatch = controller(vec![channel("@free", ChannelTier::Free)]);

    let below = dispatch.evaluate_cycle(&[usdt_at(dec!(1.0049), t0())], t0());
    assert!(below.is_empty());

    let at = dispatch.evaluate_cycle(&[usdt_at(dec!(1.005), t0())], t0());
    assert_eq!(at.len(), 1);
}

#[test]
fn test_each_tier_uses_its_own_threshold() {
    let dispatch = controller(vec![
        channel("@free", ChannelTier::Free),
        channel("@premium", ChannelTier::Premium),
        channel("@enterprise", ChannelTier::Enterprise),
    ]);

    // 0.3% clears premium (0.2%) and enterprise (0.1%) but not free (0.5%).
    let decisions = dispatch.evaluate_cycle(&[usdt_at(dec!(0.997), t0())], t0());
    let mut tiers: Vec<_> = decisions.iter().map(|d| d.tier).collect();
    tiers.sort();
    assert_eq!(tiers, vec![ChannelTier::Premium, ChannelTier::Enterprise]);
}

#[test]
fn test_premium_assets_hidden_from_free_channels() {
    let dispatch = controller(vec![
        channel("@free", ChannelTier::Free),
        channel("@premium", ChannelTier::Premium),
    ]);

    let frax = snapshot(asset("FRAX", 2), dec!(0.99), t0());
    let decisions = dispatch.evaluate_cycle(&[frax], t0());

    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].channel_id.as_str(), "@premium");
}

#[test]
fn test_cooldown_keys_are_independent() {
    let dispatch = controller(vec![
        channel("@a", ChannelTier::Free),
        channel("@b", ChannelTier::Free),
    ]);
    let cycle = [usdt_at(dec!(1.01), t0()), snapshot(asset("USDC", 1), dec!(0.99), t0())];

    assert_eq!(dispatch.evaluate_cycle(&cycle, t0()).len(), 4);
    assert!(dispatch.evaluate_cycle(&cycle, t0() + minutes(1)).is_empty());
    assert_eq!(dispatch.cooldowns().len(), 4);
}

#[test]
fn test_custom_cooldown_window() {
    let mut free = *TierPolicies::default().get(ChannelTier::Free);
    free.cooldown = Duration::from_secs(60);
    let policies = TierPolicies::new(
        free,
        *TierPolicies::default().get(ChannelTier::Premium),
        *TierPolicies::default().get(ChannelTier::Enterprise),
    )
    .expect("valid policies");
    let dispatch = DispatchController::new(
        policies,
        vec![channel("@free", ChannelTier::Free)],
        Arc::new(CooldownStore::new()),
    );

    assert_eq!(dispatch.evaluate_cycle(&[usdt_at(dec!(1.01), t0())], t0()).len(), 1);
    let later = t0() + chrono::Duration::seconds(61);
    assert_eq!(dispatch.evaluate_cycle(&[usdt_at(dec!(1.01), later)], later).len(), 1);
}

#[tokio::test]
async fn test_delivery_reports_failures_and_keeps_cooldown() {
    let dispatch = controller(vec![
        channel("@ok", ChannelTier::Free),
        channel("@broken", ChannelTier::Free),
    ]);
    let sink = RecordingSink::new().failing_for("@broken");

    let decisions = dispatch.evaluate_cycle(&[usdt_at(dec!(1.01), t0())], t0());
    let report = dispatch.deliver(&decisions, &sink).await;

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(sink.to_channel("@ok").len(), 1);

    let retry = dispatch.evaluate_cycle(&[usdt_at(dec!(1.01), t0())], t0() + minutes(1));
    assert!(retry.is_empty(), "a failed delivery still claims its cooldown");
}

#[tokio::test]
async fn test_message_lists_only_visible_assets() {
    let dispatch = controller(vec![channel("@free", ChannelTier::Free)]);
    let sink = RecordingSink::new();
    let cycle = [
        usdt_at(dec!(1.006), t0()),
        snapshot(asset("FRAX", 2), dec!(0.97), t0()),
    ];

    let decisions = dispatch.evaluate_cycle(&cycle, t0());
    dispatch.deliver(&decisions, &sink).await;

    let texts = sink.to_channel("@free");
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("USDT"));
    assert!(!texts[0].contains("FRAX"));
    assert!(texts[0].contains("+0.60%"));
}
