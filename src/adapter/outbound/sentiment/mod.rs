//! Sentiment sources.

pub mod baseline;
pub mod settings;

pub use baseline::BaselineSentimentSource;
pub use settings::SentimentConfig;
