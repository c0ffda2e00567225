//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! monitoring logic: configuration, wiring and the runtime loop.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`orchestration`] - Interval loop, shutdown and health reporting

pub mod bootstrap;
pub mod config;
pub mod orchestration;
