//! Handler for the `run` command.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::command::RunArgs;
use super::{load_config, output};
use crate::application::monitor::{CycleReport, Scheduler};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::runtime;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if args.json_logs {
        config.logging.format = "json".into();
    }
    config.init_logging();

    let scheduler = Arc::new(bootstrap::build_scheduler(&config)?);
    if !config.logging.is_json() {
        print_startup(&config, &scheduler, args.once);
    }

    if args.once {
        let report = runtime::run_once(&scheduler).await;
        print_report(&report);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(runtime::run_with_shutdown(Arc::clone(&scheduler), shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        error!(error = %e, "Monitor task failed");
    }
    Ok(())
}

fn print_startup(config: &Config, scheduler: &Scheduler, once: bool) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Assets", scheduler.assets().len());
    output::field("Channels", scheduler.controller().channels().len());
    output::field(
        "Mode",
        if once {
            "single cycle".to_string()
        } else {
            format!("every {}s", config.monitor.interval_secs)
        },
    );
    output::field("Telegram", if config.telegram.enabled { "enabled" } else { "disabled" });
    if scheduler.controller().channels().is_empty() {
        output::warning("No alert channels configured; deviations will only be logged");
    }
}

fn print_report(report: &CycleReport) {
    if output::is_json() {
        output::json_payload("cycle", serde_json::to_value(report).unwrap_or_default());
        return;
    }

    output::section("Cycle");
    if let Some(reason) = report.skipped {
        output::warning(&format!("Skipped: {reason}"));
        return;
    }
    output::field("Evaluated", report.evaluated);
    output::field("Excluded", report.excluded.len());
    output::field("Alerts", report.decisions);
    output::field("Delivered", report.delivered);
    output::field("Degradation", report.degradation);
    if report.failed > 0 {
        output::warning(&format!("{} alert(s) failed to deliver", report.failed));
    }
    for exclusion in &report.excluded {
        output::warning(&format!("{} excluded", exclusion.symbol));
    }
}
