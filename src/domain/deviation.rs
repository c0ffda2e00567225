//! Peg deviation classification.
//!
//! Deviation is computed in [`Decimal`] so band boundaries are exact: a price
//! of `1.002` against a `1.0` target is exactly `0.2%` and therefore
//! [`DeviationStatus::Warning`], never a float rounding of it.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const WARNING_PERCENT: Decimal = dec!(0.2);
const DEPEG_PERCENT: Decimal = dec!(0.5);
const CRITICAL_PERCENT: Decimal = dec!(2.0);

/// Peg status, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviationStatus {
    Stable,
    Warning,
    Depeg,
    Critical,
}

impl DeviationStatus {
    /// Band for an absolute deviation percentage. Lower bounds are inclusive.
    #[must_use]
    pub fn from_abs_percent(abs_percent: Decimal) -> Self {
        if abs_percent < WARNING_PERCENT {
            Self::Stable
        } else if abs_percent < DEPEG_PERCENT {
            Self::Warning
        } else if abs_percent < CRITICAL_PERCENT {
            Self::Depeg
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Warning => "warning",
            Self::Depeg => "depeg",
            Self::Critical => "critical",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Stable => "✅",
            Self::Warning => "⚠️",
            Self::Depeg => "🔴",
            Self::Critical => "🚨",
        }
    }
}

impl fmt::Display for DeviationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed deviation from the peg target and its status band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deviation {
    percent: Decimal,
    status: DeviationStatus,
}

impl Deviation {
    fn from_percent(percent: Decimal) -> Self {
        Self {
            percent,
            status: DeviationStatus::from_abs_percent(percent.abs()),
        }
    }

    /// Signed deviation in percent (`+0.60` means 0.6% above target).
    #[must_use]
    pub const fn percent(&self) -> Decimal {
        self.percent
    }

    #[must_use]
    pub fn abs_percent(&self) -> Decimal {
        self.percent.abs()
    }

    /// Signed deviation as a float, for statistics and display.
    #[must_use]
    pub fn percent_f64(&self) -> f64 {
        self.percent.to_f64().unwrap_or(0.0)
    }

    #[must_use]
    pub const fn status(&self) -> DeviationStatus {
        self.status
    }
}

/// Classify `price` against `target`.
///
/// A zero target yields a zero, [`DeviationStatus::Stable`] deviation instead
/// of dividing by zero. Arithmetic overflow saturates to the critical band.
#[must_use]
pub fn classify(price: Decimal, target: Decimal) -> Deviation {
    if target.is_zero() {
        return Deviation::from_percent(Decimal::ZERO);
    }

    let percent = price
        .checked_sub(target)
        .and_then(|diff| diff.checked_div(target))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX);

    Deviation::from_percent(percent)
}
