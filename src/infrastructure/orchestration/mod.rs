//! Runtime orchestration: the interval loop and health reporting.

pub mod health;
pub mod runtime;
