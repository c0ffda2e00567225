//! Scheduler wired to in-memory fakes.

use std::sync::Arc;

use pegwatch::application::dispatch::{CooldownStore, DispatchController, TierPolicies};
use pegwatch::application::monitor::{MonitorConfig, Scheduler};
use pegwatch::application::resilience::{ResilienceConfig, ResilienceLayer, RetryPolicy};
use pegwatch::domain::{AssetDefinition, Channel};
use pegwatch::testkit::clock::ManualClock;
use pegwatch::testkit::sink::RecordingSink;
use pegwatch::testkit::source::{ScriptedPriceSource, StaticSentimentSource};
use pegwatch::testkit::store::MemoryStateStore;

/// Resilience settings that fail fast: one attempt per call.
pub fn no_retry() -> ResilienceConfig {
    ResilienceConfig {
        retry: RetryPolicy::no_retry(),
        ..ResilienceConfig::default()
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub prices: Arc<ScriptedPriceSource>,
    pub sink: Arc<RecordingSink>,
    pub resilience: Arc<ResilienceLayer>,
    pub cooldowns: Arc<CooldownStore>,
    pub scheduler: Arc<Scheduler>,
}

pub struct HarnessBuilder {
    assets: Vec<AssetDefinition>,
    channels: Vec<Channel>,
    prices: ScriptedPriceSource,
    sink: RecordingSink,
    monitor: MonitorConfig,
    resilience: ResilienceConfig,
    clock: Arc<ManualClock>,
    sentiment: Option<Arc<StaticSentimentSource>>,
    store: Option<Arc<MemoryStateStore>>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            assets: Vec::new(),
            channels: Vec::new(),
            prices: ScriptedPriceSource::new(),
            sink: RecordingSink::new(),
            monitor: MonitorConfig::default(),
            resilience: no_retry(),
            clock: Arc::new(ManualClock::default()),
            sentiment: None,
            store: None,
        }
    }

    pub fn asset(mut self, asset: AssetDefinition) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn prices(mut self, prices: ScriptedPriceSource) -> Self {
        self.prices = prices;
        self
    }

    pub fn sink(mut self, sink: RecordingSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn resilience(mut self, resilience: ResilienceConfig) -> Self {
        self.resilience = resilience;
        self
    }

    pub fn clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sentiment(mut self, sentiment: Arc<StaticSentimentSource>) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn store(mut self, store: Arc<MemoryStateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Harness {
        let prices = Arc::new(self.prices);
        let sink = Arc::new(self.sink);
        let resilience = Arc::new(ResilienceLayer::new(self.resilience, self.clock.clone()));
        let cooldowns = Arc::new(CooldownStore::new());
        let controller = DispatchController::new(
            TierPolicies::default(),
            self.channels,
            Arc::clone(&cooldowns),
        );

        let mut scheduler = Scheduler::new(
            self.monitor,
            self.assets,
            prices.clone(),
            Arc::clone(&resilience),
            controller,
            sink.clone(),
            self.clock.clone(),
        );
        if let Some(sentiment) = self.sentiment {
            scheduler = scheduler.with_sentiment(sentiment);
        }
        if let Some(store) = self.store {
            scheduler = scheduler.with_state_store(store);
        }

        Harness {
            clock: self.clock,
            prices,
            sink,
            resilience,
            cooldowns,
            scheduler: Arc::new(scheduler),
        }
    }
}
