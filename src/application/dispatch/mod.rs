//! Alert dispatch: cooldown bookkeeping, gating and message rendering.

mod controller;
mod cooldown;
pub mod message;

pub use controller::{
    AlertContext, DeliveryReport, DispatchController, DispatchDecision, TierPolicies,
};
pub use cooldown::CooldownStore;
