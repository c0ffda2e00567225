//! Fault tolerance around the upstream price and sentiment feeds.
//!
//! - [`breaker`]: per call-site circuit breakers
//! - [`retry`]: retry policy and backoff
//! - [`fallback`]: last-known-good cache
//! - [`degradation`]: process-wide degradation level
//! - [`layer`]: the facade combining all of the above

pub mod breaker;
pub mod degradation;
pub mod fallback;
pub mod layer;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerPermit, BreakerRegistry, CircuitBreaker};
pub use degradation::DegradationState;
pub use fallback::FallbackCache;
pub use layer::{site, ResilienceConfig, ResilienceLayer};
pub use retry::{RetryDecision, RetryPolicy, RetryStrategy};
