//! ABOUTME: Agent runtime — role-driven agents, retry-with-backoff, and per-agent circuit breakers (§4.5)

pub mod agent;
pub mod circuit_breaker;
pub mod context;
pub mod retry;
pub mod role;

pub use agent::{Agent, AgentOutcome, RoleAgent};
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerManager};
pub use context::AgentContext;
pub use retry::execute_with_retry;
pub use role::AgentRole;
