//! Per-asset evaluation result for one cycle.

use serde::Serialize;

use super::asset::AssetDefinition;
use super::deviation::Deviation;
use super::price::PriceSample;
use super::risk::RiskAssessment;

/// Everything known about one asset at the end of a cycle's fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct AssetSnapshot {
    pub asset: AssetDefinition,
    pub sample: PriceSample,
    pub deviation: Deviation,
    pub risk: RiskAssessment,
}

impl AssetSnapshot {
    #[must_use]
    pub fn new(
        asset: AssetDefinition,
        sample: PriceSample,
        deviation: Deviation,
        risk: RiskAssessment,
    ) -> Self {
        Self {
            asset,
            sample,
            deviation,
            risk,
        }
    }
}
