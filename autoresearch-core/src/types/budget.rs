//! ABOUTME: `CycleBudget` — monotonically non-increasing token/time/cycle ceiling for one query

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remaining budget for the current query. Every field only ever
/// decreases (or stays flat) across a query's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleBudget {
    pub tokens_remaining: Option<u64>,
    pub time_remaining_ms: Option<u64>,
    pub cycles_remaining: u32,
}

impl CycleBudget {
    #[must_use]
    pub fn new(tokens: Option<u64>, time_ms: Option<u64>, cycles: u32) -> Self {
        Self {
            tokens_remaining: tokens,
            time_remaining_ms: time_ms,
            cycles_remaining: cycles,
        }
    }

    /// Deduct `tokens` and `elapsed` from the budget, saturating at zero.
    /// Never increases any field, matching the monotonicity invariant.
    pub fn consume(&mut self, tokens: u64, elapsed: Duration) {
        if let Some(t) = self.tokens_remaining.as_mut() {
            *t = t.saturating_sub(tokens);
        }
        if let Some(t) = self.time_remaining_ms.as_mut() {
            *t = t.saturating_sub(elapsed.as_millis() as u64);
        }
    }

    pub fn consume_cycle(&mut self) {
        self.cycles_remaining = self.cycles_remaining.saturating_sub(1);
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cycles_remaining == 0
            || self.tokens_remaining == Some(0)
            || self.time_remaining_ms == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_saturates_and_never_increases() {
        let mut b = CycleBudget::new(Some(10), Some(100), 2);
        b.consume(15, Duration::from_millis(200));
        assert_eq!(b.tokens_remaining, Some(0));
        assert_eq!(b.time_remaining_ms, Some(0));
        assert!(b.is_exhausted());
    }

    #[test]
    fn unbounded_dimension_stays_none() {
        let mut b = CycleBudget::new(None, None, 1);
        b.consume(1_000_000, Duration::from_secs(1));
        assert_eq!(b.tokens_remaining, None);
        assert!(!b.is_exhausted());
        b.consume_cycle();
        assert!(b.is_exhausted());
    }
}
