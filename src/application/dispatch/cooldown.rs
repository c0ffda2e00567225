//! In-memory cooldown state keyed by (asset, channel, tier).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::{CooldownKey, CooldownRecord};

/// Suppression windows for every key that has alerted at least once.
///
/// Records are created on first alert and overwritten on every later one;
/// nothing here deletes them.
#[derive(Debug, Default)]
pub struct CooldownStore {
    records: Mutex<HashMap<CooldownKey, CooldownRecord>>,
}

impl CooldownStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check the key's window and, if it has lapsed, start a new one.
    ///
    /// Returns `true` when the caller may alert. The check and the write
    /// happen under one lock acquisition.
    pub fn try_claim(&self, key: &CooldownKey, now: DateTime<Utc>, cooldown: Duration) -> bool {
        let mut records = self.records.lock();
        if records.get(key).is_some_and(|r| r.is_suppressed(now)) {
            return false;
        }

        let until = chrono::Duration::from_std(cooldown)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        records.insert(
            key.clone(),
            CooldownRecord {
                symbol: key.symbol.clone(),
                channel_id: key.channel_id.clone(),
                tier: key.tier,
                last_alert_at: now,
                suppressed_until: until,
            },
        );
        true
    }

    /// True when `key` is inside its suppression window at `now`.
    #[must_use]
    pub fn is_suppressed(&self, key: &CooldownKey, now: DateTime<Utc>) -> bool {
        self.records
            .lock()
            .get(key)
            .is_some_and(|r| r.is_suppressed(now))
    }

    #[must_use]
    pub fn get(&self, key: &CooldownKey) -> Option<CooldownRecord> {
        self.records.lock().get(key).cloned()
    }

    /// All records, ordered by key.
    #[must_use]
    pub fn records(&self) -> Vec<CooldownRecord> {
        let mut records: Vec<_> = self.records.lock().values().cloned().collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        records
    }

    /// Load persisted records, replacing any in memory with the same key.
    /// Records violating `suppressed_until >= last_alert_at` are skipped.
    pub fn restore(&self, records: impl IntoIterator<Item = CooldownRecord>) -> usize {
        let mut map = self.records.lock();
        let mut restored = 0;
        for record in records {
            if record.suppressed_until < record.last_alert_at {
                continue;
            }
            map.insert(record.key(), record);
            restored += 1;
        }
        restored
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
