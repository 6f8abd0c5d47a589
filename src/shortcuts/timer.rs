//! Single-slot timeout clock for an in-flight sequence.
//!
//! The clock never runs on its own. It records a deadline and a generation;
//! the host schedules a callback for `deadline()` and hands the generation
//! back. Re-arming bumps the generation so a callback scheduled for an older
//! deadline is recognized as stale and dropped.

/// Opaque handle identifying one arming of the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Default)]
pub struct TimeoutClock {
    deadline_ms: Option<u64>,
    generation: u64,
}

impl TimeoutClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the clock. `None` duration means never expire.
    pub fn arm(&mut self, now_ms: u64, duration_ms: Option<u64>) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.deadline_ms = duration_ms.map(|d| now_ms.saturating_add(d));
        TimerToken(self.generation)
    }

    pub fn disarm(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.deadline_ms = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn token(&self) -> TimerToken {
        TimerToken(self.generation)
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        token.0 == self.generation
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| now_ms >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_replaces_previous_deadline() {
        let mut clock = TimeoutClock::new();
        let first = clock.arm(0, Some(1000));
        let second = clock.arm(500, Some(1000));
        assert!(!clock.is_current(first));
        assert!(clock.is_current(second));
        assert_eq!(clock.deadline(), Some(1500));
        assert!(!clock.is_due(1200));
        assert!(clock.is_due(1500));
    }

    #[test]
    fn infinite_timeout_never_fires() {
        let mut clock = TimeoutClock::new();
        clock.arm(0, None);
        assert_eq!(clock.deadline(), None);
        assert!(!clock.is_due(u64::MAX));
    }

    #[test]
    fn disarm_invalidates_token() {
        let mut clock = TimeoutClock::new();
        let token = clock.arm(0, Some(10));
        clock.disarm();
        assert!(!clock.is_current(token));
        assert!(!clock.is_due(100));
    }
}
