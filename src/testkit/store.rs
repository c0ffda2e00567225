//! In-memory [`StateStore`].

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StateError;
use crate::port::outbound::store::{PersistedState, StateStore};

/// Holds the last saved state in memory.
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<PersistedState>,
    saves: Mutex<u32>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    pub fn state(&self) -> PersistedState {
        self.state.lock().clone()
    }

    pub fn saves(&self) -> u32 {
        *self.saves.lock()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<PersistedState, StateError> {
        Ok(self.state.lock().clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StateError> {
        *self.state.lock() = state.clone();
        *self.saves.lock() += 1;
        Ok(())
    }
}
