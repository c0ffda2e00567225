//! Last-known-good cache used when an upstream call fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::port::outbound::clock::Clock;

/// Keyed cache of the most recent successful payloads.
pub struct FallbackCache<V> {
    clock: Arc<dyn Clock>,
    entries: DashMap<String, (V, DateTime<Utc>)>,
}

impl<V: Clone> FallbackCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: DashMap::new(),
        }
    }

    /// Store `value` as the latest good payload for `key`.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let now = self.clock.now();
        self.entries.insert(key.into(), (value, now));
    }

    /// The cached payload for `key` and its age, if no older than `max_age`.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<(V, Duration)> {
        let entry = self.entries.get(key)?;
        let (value, stored_at) = entry.value();
        let age = (self.clock.now() - *stored_at).to_std().unwrap_or(Duration::ZERO);
        if age > max_age {
            warn!(key = %key, age_secs = age.as_secs(), "Fallback data too old");
            return None;
        }
        debug!(key = %key, age_secs = age.as_secs(), "Using fallback data");
        Some((value.clone(), age))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::clock::ManualClock;

    #[test]
    fn test_refuses_stale_entries() {
        let clock = Arc::new(ManualClock::default());
        let cache: FallbackCache<u32> = FallbackCache::new(Arc::clone(&clock) as Arc<dyn Clock>);
        cache.put("tether", 7);

        clock.advance(Duration::from_secs(300));
        assert_eq!(
            cache.get("tether", Duration::from_secs(300)),
            Some((7, Duration::from_secs(300)))
        );

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("tether", Duration::from_secs(300)), None);
        assert_eq!(cache.get("dai", Duration::from_secs(300)), None);
    }

    #[test]
    fn test_put_refreshes_timestamp() {
        let clock = Arc::new(ManualClock::default());
        let cache: FallbackCache<u32> = FallbackCache::new(Arc::clone(&clock) as Arc<dyn Clock>);
        cache.put("dai", 1);
        clock.advance(Duration::from_secs(100));
        cache.put("dai", 2);
        assert_eq!(
            cache.get("dai", Duration::from_secs(10)),
            Some((2, Duration::ZERO))
        );
        assert_eq!(cache.len(), 1);
    }
}
