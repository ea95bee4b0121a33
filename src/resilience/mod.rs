//! Failure containment for oracle calls: a per-run circuit breaker and a
//! bounded retry policy for transient generation failures.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use retry::RetryPolicy;
