//! Scheduler runtime lifecycle.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::application::monitor::{CycleReport, Scheduler};

/// Run cycles on the configured interval until `shutdown` flips to `true`
/// or its sender is dropped.
///
/// The first cycle runs immediately. A tick that arrives while a cycle is
/// still running is skipped, not queued. Shutdown during a cycle drops it,
/// aborting in-flight per-asset tasks.
pub async fn run_with_shutdown(scheduler: Arc<Scheduler>, mut shutdown: watch::Receiver<bool>) {
    if let Err(e) = scheduler.restore_state().await {
        warn!(error = %e, "Failed to restore state, starting fresh");
    }

    let interval = scheduler.config().interval();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = interval.as_secs(), "Monitor started");

    loop {
        tokio::select! {
            () = wait_for_shutdown(&mut shutdown) => break,
            _ = ticker.tick() => {
                tokio::select! {
                    report = scheduler.run_cycle() => log_report(&report),
                    () = wait_for_shutdown(&mut shutdown) => {
                        warn!("Shutdown during cycle, abandoning it");
                        break;
                    }
                }
            }
        }
    }

    info!("Monitor stopped");
}

/// Run exactly one cycle after restoring state.
pub async fn run_once(scheduler: &Scheduler) -> CycleReport {
    if let Err(e) = scheduler.restore_state().await {
        warn!(error = %e, "Failed to restore state, starting fresh");
    }
    let report = scheduler.run_cycle().await;
    log_report(&report);
    report
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            info!("Shutdown signal received");
            return;
        }
        if shutdown.changed().await.is_err() {
            info!("Shutdown channel closed");
            return;
        }
    }
}

fn log_report(report: &CycleReport) {
    if let Some(reason) = report.skipped {
        warn!(reason = %reason, "Cycle skipped");
    } else if report.evaluated == 0 {
        error!(
            excluded = report.excluded.len(),
            "Cycle evaluated no assets"
        );
    } else if report.failed > 0 {
        warn!(failed = report.failed, delivered = report.delivered, "Some alerts were not delivered");
    }
}
