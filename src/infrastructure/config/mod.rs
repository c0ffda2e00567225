//! Infrastructure configuration modules.

pub mod alerting;
pub mod logging;
pub mod settings;
pub mod state;
pub mod telegram;
