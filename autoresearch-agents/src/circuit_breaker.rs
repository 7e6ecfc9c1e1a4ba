//! ABOUTME: Per-agent circuit breaker — opens after consecutive failures, recovers after N cycles
//! ABOUTME: Scoped per query (never process-global), matching `MetricsRegistry`'s scoping rule (§5)

use autoresearch_telemetry::log_circuit_breaker_tripped;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Consecutive-failure breaker keyed on orchestration cycles rather than
/// wall-clock time: the cycle loop is the natural clock for this system
/// (§4.5), so recovery is "wait `open_cycles` more cycles", not a
/// duration.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    open_cycles: u64,
    state: RwLock<BreakerState>,
    consecutive_failures: AtomicU32,
    opened_at_cycle: AtomicU64,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, failure_threshold: u32, open_cycles: u32) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            open_cycles: u64::from(open_cycles),
            state: RwLock::new(BreakerState::Closed),
            consecutive_failures: AtomicU32::new(0),
            opened_at_cycle: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> BreakerState {
        *self.state.read()
    }

    /// Whether the agent may run in `current_cycle`. Transitions
    /// `Open → HalfOpen` once enough cycles have elapsed since opening.
    pub fn can_execute(&self, current_cycle: u64) -> bool {
        match self.state() {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                if current_cycle >= self.opened_at_cycle.load(Ordering::SeqCst) + self.open_cycles {
                    self.transition_to(BreakerState::HalfOpen);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        if self.state() == BreakerState::HalfOpen {
            self.transition_to(BreakerState::Closed);
        }
    }

    /// A failure in `Closed` trips the breaker once `failure_threshold`
    /// consecutive failures accumulate; a failure in `HalfOpen` reopens
    /// it immediately (any failure while testing recovery is disqualifying).
    /// `query_id` is carried through only for the `circuit_breaker_tripped`
    /// event, so trips correlate back to the query that caused them.
    pub fn record_failure(&self, current_cycle: u64, query_id: &str) {
        match self.state() {
            BreakerState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.failure_threshold {
                    self.open(current_cycle, query_id);
                }
            }
            BreakerState::HalfOpen => self.open(current_cycle, query_id),
            BreakerState::Open => {}
        }
    }

    fn open(&self, current_cycle: u64, query_id: &str) {
        self.opened_at_cycle.store(current_cycle, Ordering::SeqCst);
        self.transition_to(BreakerState::Open);
        log_circuit_breaker_tripped(query_id, &self.name);
    }

    fn transition_to(&self, new_state: BreakerState) {
        let mut state = self.state.write();
        if *state != new_state {
            *state = new_state;
            if new_state == BreakerState::Closed {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
        }
    }
}

/// Owns one `CircuitBreaker` per agent name, created lazily. One instance
/// per query (§5).
#[derive(Default)]
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    failure_threshold: u32,
    open_cycles: u32,
}

impl CircuitBreakerManager {
    #[must_use]
    pub fn new(failure_threshold: u32, open_cycles: u32) -> Self {
        Self {
            breakers: DashMap::new(),
            failure_threshold,
            open_cycles,
        }
    }

    pub fn get_or_create(&self, agent_name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(agent_name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(agent_name, self.failure_threshold, self.open_cycles)))
            .clone()
    }
}
