//! CoinGecko REST price source.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::CoinGeckoClient;
pub use settings::CoinGeckoConfig;
