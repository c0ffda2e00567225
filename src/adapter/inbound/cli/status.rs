//! Handler for the `status` command.

use std::path::Path;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;
use tracing::warn;

use super::check::print_health;
use super::{load_config, output};
use crate::adapter::outbound::coingecko::CoinGeckoClient;
use crate::application::monitor::{Evaluation, Scheduler};
use crate::domain::{AssetSnapshot, DeviationStatus, RiskLevel};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::health::{health_check, HealthReport};
use crate::port::outbound::clock::SystemClock;
use crate::port::outbound::notifier::NullSink;

/// Evaluate every active asset once and print the results. Nothing is sent.
pub async fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    LoggingConfig {
        level: "warn".into(),
        format: config.logging.format.clone(),
    }
    .init();

    let scheduler = bootstrap::build_scheduler_with(
        &config,
        Arc::new(CoinGeckoClient::new(&config.price_source)),
        Arc::new(NullSink),
        Arc::new(SystemClock),
    )?;
    let (evaluation, health) = collect(&scheduler, &config).await;

    if output::is_json() {
        output::json_payload(
            "status",
            json!({
                "assets": serde_json::to_value(&evaluation.snapshots).unwrap_or_default(),
                "excluded": serde_json::to_value(&evaluation.excluded).unwrap_or_default(),
                "health": serde_json::to_value(&health).unwrap_or_default(),
            }),
        );
        return Ok(());
    }

    print_table(&evaluation);
    print_health(&health);
    Ok(())
}

/// Restore persisted state, evaluate once and report runtime health.
///
/// Snapshots are sorted by absolute deviation, largest first. Unreadable
/// state is logged and the evaluation runs from a fresh start.
pub async fn collect(scheduler: &Scheduler, config: &Config) -> (Evaluation, HealthReport) {
    if let Err(e) = scheduler.restore_state().await {
        warn!(error = %e, "Persisted state unreadable, reporting fresh state");
    }

    let mut evaluation = scheduler.evaluate().await;
    evaluation
        .snapshots
        .sort_by(|a, b| b.deviation.abs_percent().cmp(&a.deviation.abs_percent()));

    let health = health_check(config).with_runtime(scheduler.resilience());
    (evaluation, health)
}

fn print_table(evaluation: &Evaluation) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::row(&format!(
        "{:<8} {:>10} {:>9}  {:<9} {:<16} {:>4}",
        "SYMBOL", "PRICE", "DEV", "STATUS", "RISK", "TIER"
    ));
    for snapshot in &evaluation.snapshots {
        output::row(&format_row(snapshot));
    }
    for exclusion in &evaluation.excluded {
        output::warning(&format!("{}: no usable price", exclusion.symbol));
    }
    if evaluation.snapshots.is_empty() {
        output::error("No prices available");
    }
}

fn format_row(snapshot: &AssetSnapshot) -> String {
    let status = snapshot.deviation.status();
    let status_cell = format!("{:<9}", status.as_str());
    let status_cell = match status {
        DeviationStatus::Stable => status_cell.green().to_string(),
        DeviationStatus::Warning => status_cell.yellow().to_string(),
        DeviationStatus::Depeg | DeviationStatus::Critical => status_cell.red().to_string(),
    };

    let risk = &snapshot.risk;
    let risk_cell = format!("{:<16}", format!("{} {:.0}", risk.risk_level(), risk.risk_score()));
    let risk_cell = match risk.risk_level() {
        RiskLevel::Low => risk_cell.green().to_string(),
        RiskLevel::Medium => risk_cell.yellow().to_string(),
        RiskLevel::High | RiskLevel::Critical => risk_cell.red().to_string(),
    };

    let cached = if snapshot.sample.provenance.is_live() { "" } else { " (cached)" };
    format!(
        "{:<8} {:>10} {:>+8.2}%  {} {} {:>4}{}",
        snapshot.asset.symbol.as_str(),
        format!("${:.4}", snapshot.sample.price.round_dp(4)),
        snapshot.deviation.percent_f64(),
        status_cell,
        risk_cell,
        snapshot.asset.tier,
        cached
    )
}
