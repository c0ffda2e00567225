//! Persistence port for cooldown, breaker and degradation state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BreakerSnapshot, CooldownRecord, DegradationLevel};
use crate::error::StateError;

/// Everything the monitor persists between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub cooldowns: Vec<CooldownRecord>,
    #[serde(default)]
    pub breakers: Vec<BreakerSnapshot>,
    /// Operator-set degradation floor.
    #[serde(default)]
    pub degradation_floor: DegradationLevel,
}

/// Storage for [`PersistedState`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last saved state. A store that has never been written returns
    /// the default (empty) state.
    async fn load(&self) -> Result<PersistedState, StateError>;

    async fn save(&self, state: &PersistedState) -> Result<(), StateError>;
}
