//! Telegram alert delivery.
//!
//! Requires the `telegram` feature to be enabled.

mod sink;

pub use sink::{recipient_for, TelegramSink};
