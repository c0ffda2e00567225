//! Scripted [`PriceSource`] and [`SentimentSource`] implementations.
//!
//! - [`ScriptedPriceSource`]: fixed prices and histories, with queued or
//!   permanent failures and an optional panicking history id. Prices can be
//!   changed between cycles.
//! - [`StaticSentimentSource`]: a fixed sample per symbol.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{SentimentSample, Symbol};
use crate::error::SourceError;
use crate::port::outbound::price::PriceSource;
use crate::port::outbound::sentiment::SentimentSource;

/// A price source with scripted responses.
///
/// `fetch_current` pops the next queued failure if any, then falls back to
/// the permanent failure, then returns the configured prices for the
/// requested ids.
pub struct ScriptedPriceSource {
    prices: Mutex<HashMap<String, Decimal>>,
    histories: Mutex<HashMap<String, Vec<f64>>>,
    failures: Mutex<VecDeque<SourceError>>,
    fail_always: Mutex<Option<SourceError>>,
    history_failure: Option<SourceError>,
    history_panic: Option<String>,
    delay: Option<Duration>,
    current_count: Arc<AtomicU32>,
    history_count: Arc<AtomicU32>,
}

impl ScriptedPriceSource {
    pub fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
            histories: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            fail_always: Mutex::new(None),
            history_failure: None,
            history_panic: None,
            delay: None,
            current_count: Arc::new(AtomicU32::new(0)),
            history_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_price(self, source_id: &str, price: Decimal) -> Self {
        self.set_price(source_id, price);
        self
    }

    pub fn with_history(self, source_id: &str, history: Vec<f64>) -> Self {
        self.histories.lock().insert(source_id.to_string(), history);
        self
    }

    /// Queue failures returned by the next `fetch_current` calls.
    pub fn with_failures(self, failures: Vec<SourceError>) -> Self {
        self.failures.lock().extend(failures);
        self
    }

    pub fn with_history_failure(mut self, error: SourceError) -> Self {
        self.history_failure = Some(error);
        self
    }

    /// Panic inside `fetch_history` for `source_id`, simulating a crashed
    /// per-asset task.
    pub fn with_history_panic(mut self, source_id: &str) -> Self {
        self.history_panic = Some(source_id.to_string());
        self
    }

    /// Sleep this long inside every `fetch_current` call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_price(&self, source_id: &str, price: Decimal) {
        self.prices.lock().insert(source_id.to_string(), price);
    }

    pub fn remove_price(&self, source_id: &str) {
        self.prices.lock().remove(source_id);
    }

    /// Fail every `fetch_current` call until cleared with `None`.
    pub fn fail_always(&self, error: Option<SourceError>) {
        *self.fail_always.lock() = error;
    }

    pub fn current_count(&self) -> u32 {
        self.current_count.load(Ordering::SeqCst)
    }

    pub fn history_count(&self) -> u32 {
        self.history_count.load(Ordering::SeqCst)
    }

    /// Shared counter of `fetch_current` calls.
    pub fn current_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.current_count)
    }
}

impl Default for ScriptedPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn fetch_current(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError> {
        self.current_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        if let Some(error) = self.fail_always.lock().clone() {
            return Err(error);
        }
        let prices = self.prices.lock();
        Ok(ids
            .iter()
            .filter_map(|id| prices.get(id).map(|p| (id.clone(), *p)))
            .collect())
    }

    async fn fetch_history(&self, source_id: &str, _days: u32) -> Result<Vec<f64>, SourceError> {
        self.history_count.fetch_add(1, Ordering::SeqCst);
        if self.history_panic.as_deref() == Some(source_id) {
            panic!("scripted history panic for {source_id}");
        }
        if let Some(error) = &self.history_failure {
            return Err(error.clone());
        }
        Ok(self
            .histories
            .lock()
            .get(source_id)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A sentiment source returning fixed samples.
#[derive(Default)]
pub struct StaticSentimentSource {
    samples: HashMap<Symbol, SentimentSample>,
    calls: AtomicU32,
}

impl StaticSentimentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(mut self, sample: SentimentSample) -> Self {
        self.samples.insert(sample.symbol.clone(), sample);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentSource for StaticSentimentSource {
    async fn analyze(&self, symbol: &Symbol) -> Result<Option<SentimentSample>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.samples.get(symbol).cloned())
    }
}
