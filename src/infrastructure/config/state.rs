//! State persistence configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// State configuration (`[state]`).
///
/// Without a `path`, cooldowns and breaker states live in memory only and
/// are lost on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}
