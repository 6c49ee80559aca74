//! Armed deadlines for timed transitions
//!
//! A deadline lives inside the state that armed it. Leaving that state
//! drops the deadline with it, so nothing can fire into a later session.

use serde::{Deserialize, Serialize};

/// A point in host time (ms) after which a transition is due
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub at_ms: f64,
}

impl Deadline {
    /// Arm a deadline `delay_ms` after `now_ms`
    pub fn after(now_ms: f64, delay_ms: f64) -> Self {
        Self {
            at_ms: now_ms + delay_ms,
        }
    }

    /// Re-arm relative to this deadline, keeping a steady cadence even when
    /// frames arrive late
    pub fn next(self, delay_ms: f64) -> Self {
        Self {
            at_ms: self.at_ms + delay_ms,
        }
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms >= self.at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_at_exact_deadline() {
        let d = Deadline::after(100.0, 50.0);
        assert!(!d.is_due(149.9));
        assert!(d.is_due(150.0));
    }

    #[test]
    fn test_next_keeps_cadence() {
        let d = Deadline::after(0.0, 1000.0).next(1000.0);
        assert_eq!(d.at_ms, 2000.0);
    }
}
