//! JSON file implementation of [`StateStore`].
//!
//! Saves write a sibling `*.tmp` file and rename it over the target so a
//! crash mid-write never leaves a truncated state file behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::StateError;
use crate::port::outbound::store::{PersistedState, StateStore};

pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<PersistedState, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No saved state, starting fresh");
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(e.into()),
        };
        let state: PersistedState = serde_json::from_slice(&bytes)?;
        debug!(
            path = %self.path.display(),
            cooldowns = state.cooldowns.len(),
            breakers = state.breakers.len(),
            "Loaded state"
        );
        Ok(state)
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::{
        BreakerSnapshot, BreakerState, ChannelId, ChannelTier, CooldownRecord, DegradationLevel,
        Symbol,
    };

    fn sample_state() -> PersistedState {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        PersistedState {
            cooldowns: vec![CooldownRecord {
                symbol: Symbol::from("USDC"),
                channel_id: ChannelId::from("-100123"),
                tier: ChannelTier::Free,
                last_alert_at: at,
                suppressed_until: at + chrono::Duration::minutes(30),
            }],
            breakers: vec![BreakerSnapshot {
                name: "price-fetch".to_string(),
                state: BreakerState::Open,
                failure_count: 5,
                last_failure_at: Some(at),
            }],
            degradation_floor: DegradationLevel::Reduced,
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("nested").join("state.json"));
        let state = sample_state();

        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_without_floor_loads_normal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"cooldowns": [], "breakers": []}"#).unwrap();
        let state = JsonStateStore::new(path).load().await.unwrap();
        assert_eq!(state.degradation_floor, DegradationLevel::Normal);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonStateStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StateError::Json(_)));
    }
}
