//! Application services (use cases).
//!
//! These services combine domain logic with the outbound ports to implement
//! the monitor: risk scoring, fault tolerance, alert dispatch and the cycle
//! that ties them together.

pub mod dispatch;
pub mod monitor;
pub mod resilience;
pub mod risk;
