//! Process-wide degradation level.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{info, warn};

use super::breaker::BreakerRegistry;
use super::layer::site;
use crate::domain::{BreakerState, DegradationLevel};

/// Shared, lock-free holder of the current [`DegradationLevel`].
///
/// Two inputs are kept apart: the operator floor and the level derived from
/// breaker states. The effective level is the more severe of the two, so the
/// automatic policy can raise the level above the floor but never below it.
#[derive(Debug, Default)]
pub struct DegradationState {
    floor: AtomicU8,
    derived: AtomicU8,
}

impl DegradationState {
    /// Start with `floor` as the operator-set minimum.
    #[must_use]
    pub fn new(floor: DegradationLevel) -> Self {
        Self {
            floor: AtomicU8::new(floor.to_u8()),
            derived: AtomicU8::new(DegradationLevel::Normal.to_u8()),
        }
    }

    /// Effective level: the more severe of the floor and the derived level.
    #[must_use]
    pub fn level(&self) -> DegradationLevel {
        self.floor().max(self.derived())
    }

    #[must_use]
    pub fn floor(&self) -> DegradationLevel {
        DegradationLevel::from_u8(self.floor.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn derived(&self) -> DegradationLevel {
        DegradationLevel::from_u8(self.derived.load(Ordering::Acquire))
    }

    /// Set the operator floor. This is the only way in or out of
    /// [`DegradationLevel::Emergency`].
    pub fn set(&self, level: DegradationLevel) {
        let previous = DegradationLevel::from_u8(self.floor.swap(level.to_u8(), Ordering::AcqRel));
        if previous != level {
            warn!(from = %previous, to = %level, effective = %self.level(), "Degradation floor set");
        }
    }

    /// Derive a level from breaker states and return the effective level.
    ///
    /// An open price-fetch breaker means `Minimal`; any other open breaker
    /// means `Reduced`; otherwise `Normal`. The floor is left untouched.
    pub fn apply_policy(&self, breakers: &BreakerRegistry) -> DegradationLevel {
        let next = policy_level(breakers);
        let previous = DegradationLevel::from_u8(self.derived.swap(next.to_u8(), Ordering::AcqRel));
        let effective = self.level();
        if previous != next {
            info!(from = %previous, to = %next, floor = %self.floor(), effective = %effective, "Degradation level changed");
        }
        effective
    }
}

fn policy_level(breakers: &BreakerRegistry) -> DegradationLevel {
    let tripped = |state: BreakerState| state != BreakerState::Closed;

    if tripped(breakers.state(site::PRICE_FETCH)) {
        return DegradationLevel::Minimal;
    }
    if breakers
        .snapshots()
        .iter()
        .any(|snapshot| snapshot.name != site::PRICE_FETCH && tripped(snapshot.state))
    {
        return DegradationLevel::Reduced;
    }
    DegradationLevel::Normal
}
