//! Composition root: turns a [`Config`] into a ready [`Scheduler`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::coingecko::CoinGeckoClient;
#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::TelegramSink;
use crate::adapter::outbound::sentiment::BaselineSentimentSource;
use crate::adapter::outbound::state::JsonStateStore;
use crate::application::dispatch::{CooldownStore, DispatchController};
use crate::application::monitor::Scheduler;
use crate::application::resilience::ResilienceLayer;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::clock::{Clock, SystemClock};
use crate::port::outbound::notifier::{AlertSink, LogSink};
use crate::port::outbound::price::PriceSource;

/// Build the alert sink from configuration.
///
/// Telegram is used when enabled and a token is present; otherwise alerts
/// go to the log.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when Telegram is enabled without a
/// `TELEGRAM_BOT_TOKEN`.
#[allow(clippy::result_large_err)]
pub fn build_sink(config: &Config) -> Result<Arc<dyn AlertSink>> {
    if !config.telegram.enabled {
        info!("Telegram disabled, alerts will be logged");
        return Ok(Arc::new(LogSink));
    }

    let Some(token) = config.telegram.bot_token.as_deref().filter(|t| !t.trim().is_empty())
    else {
        return Err(ConfigError::MissingField {
            field: "TELEGRAM_BOT_TOKEN",
        }
        .into());
    };

    Ok(telegram_sink(token))
}

#[cfg(feature = "telegram")]
fn telegram_sink(token: &str) -> Arc<dyn AlertSink> {
    Arc::new(TelegramSink::new(token))
}

#[cfg(not(feature = "telegram"))]
fn telegram_sink(_token: &str) -> Arc<dyn AlertSink> {
    warn!("Telegram enabled but this build lacks the telegram feature, alerts will be logged");
    Arc::new(LogSink)
}

/// Build a scheduler with the production adapters.
///
/// # Errors
///
/// Returns an error when the tier policies or Telegram settings are invalid.
#[allow(clippy::result_large_err)]
pub fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let prices: Arc<dyn PriceSource> = Arc::new(CoinGeckoClient::new(&config.price_source));
    let sink = build_sink(config)?;
    build_scheduler_with(config, prices, sink, clock)
}

/// Build a scheduler around caller-supplied price source, sink and clock.
///
/// # Errors
///
/// Returns an error when the tier policies are invalid.
#[allow(clippy::result_large_err)]
pub fn build_scheduler_with(
    config: &Config,
    prices: Arc<dyn PriceSource>,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
) -> Result<Scheduler> {
    let resilience = Arc::new(ResilienceLayer::new(
        config.resilience.clone(),
        Arc::clone(&clock),
    ));

    let channels = config.alerting.channels();
    if channels.is_empty() {
        warn!("No alert channels configured, cycles will evaluate but never alert");
    }
    let controller = DispatchController::new(
        config.alerting.policies()?,
        channels,
        Arc::new(CooldownStore::new()),
    );

    let assets = config.assets();
    info!(
        assets = assets.iter().filter(|a| a.active).count(),
        channels = controller.channels().len(),
        source = prices.name(),
        sink = sink.name(),
        interval_secs = config.monitor.interval_secs,
        "Scheduler configured"
    );

    let mut scheduler = Scheduler::new(
        config.monitor.clone(),
        assets,
        prices,
        resilience,
        controller,
        sink,
        Arc::clone(&clock),
    );

    if config.sentiment.enabled {
        scheduler = scheduler.with_sentiment(Arc::new(BaselineSentimentSource::new(
            config.sentiment.clone(),
            clock,
        )));
    }
    if let Some(path) = &config.state.path {
        info!(path = %path.display(), "State persistence enabled");
        scheduler = scheduler.with_state_store(Arc::new(JsonStateStore::new(path.clone())));
    }

    Ok(scheduler)
}
