//! One monitoring cycle: fetch, fan out, join, dispatch.
//!
//! ```text
//!   price-fetch (batch) ──► lookups ──► JoinSet fan-out (bounded)
//!                                        ├─ price-history
//!                                        ├─ sentiment-fetch
//!                                        └─ classify + assess
//!                                    ──► join ──► DispatchController ──► AlertSink
//! ```
//!
//! Cooldowns are only written at the join point, by the controller, so an
//! aborted cycle never leaves partial cooldown state behind.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::config::MonitorConfig;
use crate::application::dispatch::DispatchController;
use crate::application::resilience::{site, ResilienceLayer};
use crate::application::risk::{RiskEngine, RiskInput};
use crate::domain::{
    classify, AssetDefinition, AssetSnapshot, DegradationLevel, Horizon, PriceLookup,
    PriceSample, Provenance, Symbol,
};
use crate::error::StateError;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::notifier::AlertSink;
use crate::port::outbound::price::PriceSource;
use crate::port::outbound::sentiment::SentimentSource;
use crate::port::outbound::store::{PersistedState, StateStore};

/// Why a cycle did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The degradation level is `Emergency`.
    Emergency,
    /// Another cycle was still running.
    Overlap,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emergency => f.write_str("emergency degradation"),
            Self::Overlap => f.write_str("previous cycle still running"),
        }
    }
}

/// Why an asset was left out of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The source returned no usable price and no fresh fallback existed.
    MissingPrice,
    /// The per-asset task failed or panicked.
    TaskFailed { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Snapshots produced by the fan-out, before dispatch.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub snapshots: Vec<AssetSnapshot>,
    pub excluded: Vec<Exclusion>,
}

/// Summary of one [`Scheduler::run_cycle`] call.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub evaluated: usize,
    pub excluded: Vec<Exclusion>,
    pub decisions: usize,
    pub delivered: usize,
    pub failed: usize,
    pub degradation: DegradationLevel,
    pub skipped: Option<SkipReason>,
}

impl CycleReport {
    fn skipped(started_at: DateTime<Utc>, degradation: DegradationLevel, reason: SkipReason) -> Self {
        Self {
            started_at,
            evaluated: 0,
            excluded: Vec::new(),
            decisions: 0,
            delivered: 0,
            failed: 0,
            degradation,
            skipped: Some(reason),
        }
    }
}

/// Drives monitoring cycles over a fixed asset list.
pub struct Scheduler {
    config: MonitorConfig,
    assets: Arc<[AssetDefinition]>,
    prices: Arc<dyn PriceSource>,
    sentiment: Option<Arc<dyn SentimentSource>>,
    resilience: Arc<ResilienceLayer>,
    engine: RiskEngine,
    controller: DispatchController,
    sink: Arc<dyn AlertSink>,
    store: Option<Arc<dyn StateStore>>,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<()>,
}

impl Scheduler {
    /// Create a scheduler. Inactive assets are dropped here.
    pub fn new(
        config: MonitorConfig,
        assets: Vec<AssetDefinition>,
        prices: Arc<dyn PriceSource>,
        resilience: Arc<ResilienceLayer>,
        controller: DispatchController,
        sink: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let assets: Vec<_> = assets.into_iter().filter(|a| a.active).collect();
        Self {
            config,
            assets: assets.into(),
            prices,
            sentiment: None,
            resilience,
            engine: RiskEngine::new(Arc::clone(&clock)),
            controller,
            sink,
            store: None,
            clock,
            in_flight: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentSource>) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    #[must_use]
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn assets(&self) -> &[AssetDefinition] {
        &self.assets
    }

    #[must_use]
    pub fn resilience(&self) -> &Arc<ResilienceLayer> {
        &self.resilience
    }

    #[must_use]
    pub fn controller(&self) -> &DispatchController {
        &self.controller
    }

    /// Load persisted cooldowns, breaker states and the degradation floor, if
    /// a store is configured.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the state exists but cannot be read.
    pub async fn restore_state(&self) -> Result<(), StateError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let state = store.load().await?;
        let cooldowns = self.controller.cooldowns().restore(state.cooldowns);
        self.resilience.breakers().restore(&state.breakers);
        self.resilience.restore_degradation_floor(state.degradation_floor);
        info!(
            cooldowns,
            breakers = state.breakers.len(),
            degradation_floor = %self.resilience.degradation_floor(),
            "Restored persisted state"
        );
        Ok(())
    }

    /// Run one full cycle unless one is already running.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = self.clock.now();
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Previous cycle still running, skipping");
            return CycleReport::skipped(
                started_at,
                self.resilience.degradation(),
                SkipReason::Overlap,
            );
        };

        let level = self.resilience.degradation();
        if !level.allows_cycles() {
            warn!(degradation = %level, "Emergency degradation, skipping cycle");
            return CycleReport::skipped(started_at, level, SkipReason::Emergency);
        }

        let evaluation = self.evaluate_with(level).await;
        let now = self.clock.now();
        let decisions = self.controller.evaluate_cycle(&evaluation.snapshots, now);
        let delivery = self.controller.deliver(&decisions, self.sink.as_ref()).await;

        let degradation = if self.config.auto_degradation {
            self.resilience.apply_degradation_policy()
        } else {
            self.resilience.degradation()
        };
        self.persist().await;

        let report = CycleReport {
            started_at,
            evaluated: evaluation.snapshots.len(),
            excluded: evaluation.excluded,
            decisions: decisions.len(),
            delivered: delivery.delivered,
            failed: delivery.failed,
            degradation,
            skipped: None,
        };
        info!(
            evaluated = report.evaluated,
            excluded = report.excluded.len(),
            decisions = report.decisions,
            delivered = report.delivered,
            failed = report.failed,
            degradation = %report.degradation,
            "Cycle complete"
        );
        report
    }

    /// Fetch and score every active asset without dispatching anything.
    pub async fn evaluate(&self) -> Evaluation {
        self.evaluate_with(self.resilience.degradation()).await
    }

    async fn evaluate_with(&self, level: DegradationLevel) -> Evaluation {
        let lookups = self.lookup_prices().await;

        let mut evaluation = Evaluation::default();
        let mut pending = Vec::new();
        for (asset, lookup) in self.assets.iter().zip(lookups) {
            match lookup {
                PriceLookup::Available(sample) => pending.push((asset.clone(), sample)),
                PriceLookup::Missing { symbol, .. } => evaluation.excluded.push(Exclusion {
                    symbol,
                    reason: ExclusionReason::MissingPrice,
                }),
            }
        }

        if pending.is_empty() {
            error!(
                assets = self.assets.len(),
                "No usable prices this cycle, nothing to evaluate"
            );
            return evaluation;
        }

        let (snapshots, failed) = self.fan_out(pending, level).await;
        evaluation.snapshots = snapshots;
        evaluation.excluded.extend(failed);
        evaluation
    }

    /// Batch price fetch with fallback, one lookup per asset in order.
    async fn lookup_prices(&self) -> Vec<PriceLookup> {
        let ids: Vec<String> = self.assets.iter().map(|a| a.source_id.clone()).collect();
        let source = self.prices.as_ref();
        let ids_ref = ids.as_slice();
        let fetched = self
            .resilience
            .call(site::PRICE_FETCH, move || source.fetch_current(ids_ref))
            .await;
        let now = self.clock.now();

        match fetched {
            Ok(prices) => self
                .assets
                .iter()
                .map(|asset| self.live_lookup(asset, &prices, now))
                .collect(),
            Err(e) => {
                error!(source = self.prices.name(), error = %e, "Price fetch failed, trying fallback cache");
                self.assets
                    .iter()
                    .map(|asset| self.fallback_lookup(asset, now))
                    .collect()
            }
        }
    }

    fn live_lookup(
        &self,
        asset: &AssetDefinition,
        prices: &HashMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> PriceLookup {
        match prices.get(&asset.source_id) {
            Some(price) if *price > Decimal::ZERO => {
                self.resilience.remember_price(&asset.source_id, *price);
                PriceLookup::Available(PriceSample::live(asset.symbol.clone(), *price, now))
            }
            Some(price) => {
                error!(symbol = %asset.symbol, id = %asset.source_id, price = %price, "Unusable price from source, excluding asset");
                missing(asset)
            }
            None => {
                error!(symbol = %asset.symbol, id = %asset.source_id, "Price missing from response, excluding asset");
                missing(asset)
            }
        }
    }

    fn fallback_lookup(&self, asset: &AssetDefinition, now: DateTime<Utc>) -> PriceLookup {
        match self.resilience.fallback_price(&asset.source_id) {
            Some((price, age)) => {
                warn!(symbol = %asset.symbol, age_secs = age.as_secs(), "Using cached price");
                PriceLookup::Available(PriceSample {
                    symbol: asset.symbol.clone(),
                    price,
                    observed_at: now,
                    provenance: Provenance::Fallback { age },
                })
            }
            None => {
                error!(symbol = %asset.symbol, "No fresh cached price, excluding asset");
                missing(asset)
            }
        }
    }

    async fn fan_out(
        &self,
        pending: Vec<(AssetDefinition, PriceSample)>,
        level: DegradationLevel,
    ) -> (Vec<AssetSnapshot>, Vec<Exclusion>) {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut outstanding: BTreeMap<usize, Symbol> = BTreeMap::new();

        for (index, (asset, sample)) in pending.into_iter().enumerate() {
            outstanding.insert(index, asset.symbol.clone());
            let job = AssetJob {
                asset,
                sample,
                level,
                horizon: self.config.horizon,
                history_days: self.config.history_days,
                prices: Arc::clone(&self.prices),
                sentiment: self.sentiment.clone(),
                resilience: Arc::clone(&self.resilience),
                engine: self.engine.clone(),
            };
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (index, job.run().await)
            });
        }

        let mut done: BTreeMap<usize, AssetSnapshot> = BTreeMap::new();
        let mut excluded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, snapshot)) => {
                    outstanding.remove(&index);
                    done.insert(index, snapshot);
                }
                Err(e) => {
                    error!(error = %e, "Asset evaluation task failed");
                }
            }
        }

        // Whatever never reported back panicked or was cancelled.
        for symbol in outstanding.into_values() {
            error!(symbol = %symbol, "Asset evaluation did not complete, excluding asset");
            excluded.push(Exclusion {
                symbol,
                reason: ExclusionReason::TaskFailed {
                    detail: "evaluation task panicked or was cancelled".to_string(),
                },
            });
        }

        (done.into_values().collect(), excluded)
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let state = PersistedState {
            cooldowns: self.controller.cooldowns().records(),
            breakers: self.resilience.breaker_snapshots(),
            degradation_floor: self.resilience.degradation_floor(),
        };
        if let Err(e) = store.save(&state).await {
            warn!(error = %e, "Failed to persist state");
        }
    }
}

fn missing(asset: &AssetDefinition) -> PriceLookup {
    PriceLookup::Missing {
        symbol: asset.symbol.clone(),
        source_id: asset.source_id.clone(),
    }
}

/// Everything one per-asset task needs, owned so it can be spawned.
struct AssetJob {
    asset: AssetDefinition,
    sample: PriceSample,
    level: DegradationLevel,
    horizon: Horizon,
    history_days: u32,
    prices: Arc<dyn PriceSource>,
    sentiment: Option<Arc<dyn SentimentSource>>,
    resilience: Arc<ResilienceLayer>,
    engine: RiskEngine,
}

impl AssetJob {
    async fn run(self) -> AssetSnapshot {
        let history = self.history().await;
        let sentiment = self.sentiment().await;

        let deviation = classify(self.sample.price, self.asset.target);
        let target = self.asset.target.to_f64().unwrap_or(1.0);
        let input = RiskInput::new(&self.asset.symbol, &history)
            .with_sentiment(sentiment.as_ref())
            .with_target(target);
        let risk = self.engine.assess(input, self.horizon);

        debug!(
            symbol = %self.asset.symbol,
            price = %self.sample.price,
            deviation = %deviation.percent(),
            status = %deviation.status(),
            risk = risk.risk_score(),
            "Asset evaluated"
        );

        AssetSnapshot::new(self.asset, self.sample, deviation, risk)
    }

    async fn history(&self) -> Vec<f64> {
        if !self.level.allows_history() {
            return Vec::new();
        }
        let source = self.prices.as_ref();
        let id = self.asset.source_id.as_str();
        let days = self.history_days;
        match self
            .resilience
            .call(site::PRICE_HISTORY, move || source.fetch_history(id, days))
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(symbol = %self.asset.symbol, error = %e, "History unavailable, scoring without it");
                Vec::new()
            }
        }
    }

    async fn sentiment(&self) -> Option<crate::domain::SentimentSample> {
        if !self.level.allows_sentiment() {
            return None;
        }
        let source = self.sentiment.as_deref()?;
        let symbol = &self.asset.symbol;
        match self
            .resilience
            .call(site::SENTIMENT_FETCH, move || source.analyze(symbol))
            .await
        {
            Ok(sample) => sample,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Sentiment unavailable, scoring without it");
                None
            }
        }
    }
}
