//! Handler for the `check` command.

use std::path::Path;

use super::{load_config, output};
use crate::domain::ChannelTier;
use crate::error::{ConfigError, Result};
use crate::infrastructure::orchestration::health::{health_check, HealthReport, HealthStatus};

/// Validate the configuration and print a health report.
///
/// # Errors
///
/// Fails when the configuration is invalid or a critical check fails.
#[allow(clippy::result_large_err)]
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    output::section("Configuration Check");
    output::field("Config", config_path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    let assets = config.assets();
    output::field(
        "Assets",
        format!(
            "{} active of {}{}",
            assets.iter().filter(|a| a.active).count(),
            assets.len(),
            if config.assets.is_empty() { " (built-in catalog)" } else { "" }
        ),
    );
    let channels = config.alerting.channels();
    for tier in ChannelTier::ALL {
        let count = channels.iter().filter(|c| c.tier == tier).count();
        output::field(&format!("{tier} channels"), count);
    }
    output::field("Interval", format!("{}s", config.monitor.interval_secs));
    output::field("Horizon", config.monitor.horizon);
    output::field(
        "State",
        config
            .state
            .path
            .as_ref()
            .map_or_else(|| "in memory".to_string(), |p| p.display().to_string()),
    );

    output::field(
        "Degradation floor",
        config.resilience.degradation.unwrap_or_default(),
    );

    let report = health_check(&config);
    print_health(&report);

    if !report.is_healthy() {
        return Err(ConfigError::InvalidValue {
            field: "health",
            reason: "one or more critical checks failed".to_string(),
        }
        .into());
    }

    output::success("Configuration check complete");
    Ok(())
}

/// Print each check: critical failures as errors, others as warnings.
pub(super) fn print_health(report: &HealthReport) {
    output::section("Health");
    for check in report.checks() {
        match check.status() {
            HealthStatus::Healthy => output::success(check.name()),
            HealthStatus::Unhealthy(reason) if check.critical() => {
                output::error(&format!("{}: {reason}", check.name()));
            }
            HealthStatus::Unhealthy(reason) => {
                output::warning(&format!("{}: {reason}", check.name()));
            }
        }
    }
}
