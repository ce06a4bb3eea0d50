// src/session/clock.rs

use serde::Serialize;

/// Seconds remaining in an exam session.
///
/// The counter saturates at zero, so a countdown display never shows a
/// negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionClock {
    remaining: u32,
}

impl SessionClock {
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            remaining: duration_seconds,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Removes one second and returns what is left.
    pub fn decrement(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_zero() {
        let mut clock = SessionClock::new(3);
        assert_eq!(clock.decrement(), 2);
        assert_eq!(clock.decrement(), 1);
        assert_eq!(clock.decrement(), 0);
        assert!(clock.is_exhausted());
    }

    #[test]
    fn never_goes_below_zero() {
        let mut clock = SessionClock::new(1);
        clock.decrement();
        assert_eq!(clock.decrement(), 0);
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn zero_duration_starts_exhausted() {
        assert!(SessionClock::new(0).is_exhausted());
    }
}
