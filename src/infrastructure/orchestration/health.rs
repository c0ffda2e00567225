//! Configuration and runtime health reporting.

use serde::Serialize;
use url::Url;

use crate::application::resilience::ResilienceLayer;
use crate::domain::{BreakerState, DegradationLevel};
use crate::infrastructure::config::settings::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &'static str, critical: bool, problem: Option<String>) -> Self {
        Self {
            name,
            critical,
            status: problem.map_or(HealthStatus::Healthy, HealthStatus::Unhealthy),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }

    /// Append breaker and degradation checks from a live resilience layer.
    ///
    /// Open breakers are a warning. The degradation check fails critically
    /// only at `Emergency`.
    #[must_use]
    pub fn with_runtime(mut self, resilience: &ResilienceLayer) -> Self {
        let tripped: Vec<String> = resilience
            .breaker_snapshots()
            .into_iter()
            .filter(|b| b.state != BreakerState::Closed)
            .map(|b| format!("{} {}", b.name, b.state))
            .collect();
        self.checks.push(HealthCheck::new(
            "breakers",
            false,
            (!tripped.is_empty()).then(|| tripped.join(", ")),
        ));

        let level = resilience.degradation();
        let floor = resilience.degradation_floor();
        self.checks.push(HealthCheck::new(
            "degradation",
            level == DegradationLevel::Emergency,
            (level != DegradationLevel::Normal)
                .then(|| format!("running at {level} (operator floor {floor})")),
        ));
        self
    }
}

pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    let active = config.assets().iter().filter(|a| a.active).count();
    checks.push(HealthCheck::new(
        "assets",
        true,
        (active == 0).then(|| "no active assets".to_string()),
    ));

    checks.push(HealthCheck::new(
        "channels",
        false,
        config
            .alerting
            .channels
            .is_empty()
            .then(|| "no alert channels configured".to_string()),
    ));

    checks.push(HealthCheck::new(
        "telegram",
        config.telegram.enabled,
        (config.telegram.enabled && !config.telegram.token_present())
            .then(|| "TELEGRAM_BOT_TOKEN is not set".to_string()),
    ));

    let url_problem = match Url::parse(&config.price_source.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => None,
        Ok(url) => Some(format!("unsupported scheme {}", url.scheme())),
        Err(e) => Some(e.to_string()),
    };
    checks.push(HealthCheck::new("price_source", true, url_problem));

    HealthReport { checks }
}
