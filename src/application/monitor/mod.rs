//! The monitoring cycle and its settings.

mod config;
mod scheduler;

pub use config::MonitorConfig;
pub use scheduler::{
    CycleReport, Evaluation, Exclusion, ExclusionReason, Scheduler, SkipReason,
};
