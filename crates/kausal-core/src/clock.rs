//! Lamport logical clock.
//!
//! A single monotonic counter per process. Two rules produce the
//! happens-before partial order:
//!
//! - Every local event (including a send and the final event) ticks the
//!   counter by one.
//! - A receive event sets the counter to `max(local, remote) + 1`, so the
//!   receive always carries a larger timestamp than both the matching send
//!   and the receiver's previous event.
//!
//! The counter is a plain `u64`; overflow over very long runs is a
//! theoretical failure mode and is not guarded.

/// Per-process Lamport clock.
///
/// Owned exclusively by one [`crate::ProcessWorker`]. Other processes only
/// observe it transitively through message timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LamportClock {
    time: u64,
}

impl LamportClock {
    /// Create a clock starting at 0.
    #[must_use]
    pub fn new() -> Self {
        Self { time: 0 }
    }

    /// Current reading without advancing.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.time
    }

    /// Advance for a local event (or a send, or the final event).
    ///
    /// Returns the new value.
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        self.time
    }

    /// Apply the Lamport receive rule for an incoming timestamp.
    ///
    /// Sets the counter to `max(current, remote) + 1` and returns the new
    /// value. The result strictly exceeds both the local predecessor and the
    /// sender's stamp.
    pub fn observe(&mut self, remote: u64) -> u64 {
        self.time = self.time.max(remote) + 1;
        self.time
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(LamportClock::new().value(), 0);
    }

    #[test]
    fn tick_increments_by_one() {
        let mut clock = LamportClock::new();
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.value(), 2);
    }

    #[test]
    fn observe_takes_max_plus_one() {
        let mut clock = LamportClock::new();
        clock.tick(); // 1

        // Remote ahead of us.
        assert_eq!(clock.observe(7), 8);
        // Remote behind us.
        assert_eq!(clock.observe(3), 9);
        // Remote equal to us.
        assert_eq!(clock.observe(9), 10);
    }

    proptest! {
        #[test]
        fn observe_exceeds_both_inputs(local in 0u64..1_000_000, remote in 0u64..1_000_000) {
            let mut clock = LamportClock { time: local };
            let result = clock.observe(remote);
            prop_assert!(result > local);
            prop_assert!(result > remote);
            prop_assert_eq!(result, local.max(remote) + 1);
        }

        #[test]
        fn any_event_strictly_increases(start in 0u64..1_000_000, remote in 0u64..1_000_000) {
            let mut ticked = LamportClock { time: start };
            prop_assert!(ticked.tick() > start);

            let mut observed = LamportClock { time: start };
            prop_assert!(observed.observe(remote) > start);
        }
    }
}
