//! Depeg risk scoring.

mod engine;
pub mod stats;

pub use engine::{RiskEngine, RiskInput};
