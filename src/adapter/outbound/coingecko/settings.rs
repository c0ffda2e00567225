//! CoinGecko client configuration.

use std::time::Duration;

use serde::Deserialize;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Settings for [`CoinGeckoClient`](super::CoinGeckoClient).
///
/// The API key is never read from the file; it comes from `COINGECKO_API_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoinGeckoConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Decimal places requested for spot prices.
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_precision() -> u32 {
    4
}

impl CoinGeckoConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            precision: default_precision(),
            api_key: None,
        }
    }
}
