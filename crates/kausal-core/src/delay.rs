//! Injectable simulated latency.
//!
//! The worker state machine never sleeps; the runner asks a [`DelaySource`]
//! how long the processing pause before a send and the in-transit delay of a
//! message should be, and performs the actual waiting. Swapping the source
//! lets tests run with zero or fixed delay while the binary uses seeded
//! randomized delays.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::message::ProcessId;

/// Strategy deciding simulated processing and transit latency.
pub trait DelaySource: Send {
    /// Pause between a process's local event and its send event.
    fn processing_delay(&mut self, id: ProcessId) -> Duration;

    /// Time a message from `id` spends in transit before delivery.
    fn transit_delay(&mut self, id: ProcessId) -> Duration;
}

/// Zero delay everywhere. The fastest option for invariant tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelaySource for NoDelay {
    fn processing_delay(&mut self, _id: ProcessId) -> Duration {
        Duration::ZERO
    }

    fn transit_delay(&mut self, _id: ProcessId) -> Duration {
        Duration::ZERO
    }
}

/// The same fixed delay for every process and every message.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Delay every pause and transit by `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl DelaySource for FixedDelay {
    fn processing_delay(&mut self, _id: ProcessId) -> Duration {
        self.delay
    }

    fn transit_delay(&mut self, _id: ProcessId) -> Duration {
        self.delay
    }
}

/// Per-process staggered base delay plus seeded uniform jitter.
///
/// Mirrors the classic demo staggering: process `i` thinks for
/// `processing_base + i * stagger` and its message travels for
/// `transit_base + i * stagger / 2`, each widened by up to `jitter` of
/// random slack. Deterministic for a fixed seed.
#[derive(Debug, Clone)]
pub struct UniformDelay {
    processing_base: Duration,
    transit_base: Duration,
    stagger: Duration,
    jitter: Duration,
    rng: StdRng,
}

impl UniformDelay {
    /// Build a seeded source from base delays, stagger step and jitter bound.
    #[must_use]
    pub fn new(
        processing_base: Duration,
        transit_base: Duration,
        stagger: Duration,
        jitter: Duration,
        seed: u64,
    ) -> Self {
        Self { processing_base, transit_base, stagger, jitter, rng: StdRng::seed_from_u64(seed) }
    }

    /// Upper bound on any transit delay this source can produce.
    ///
    /// Used to size wait budgets so no message is lost under timely
    /// delivery.
    #[must_use]
    pub fn max_transit_delay(&self, processes: usize) -> Duration {
        let worst_stagger = self.stagger * (processes.saturating_sub(1) as u32) / 2;
        self.transit_base + worst_stagger + self.jitter
    }

    fn jittered(&mut self, base: Duration) -> Duration {
        if self.jitter.is_zero() {
            return base;
        }
        let slack = self.rng.gen_range(Duration::ZERO..=self.jitter);
        base + slack
    }
}

impl DelaySource for UniformDelay {
    fn processing_delay(&mut self, id: ProcessId) -> Duration {
        let base = self.processing_base + self.stagger * id;
        self.jittered(base)
    }

    fn transit_delay(&mut self, id: ProcessId) -> Duration {
        let base = self.transit_base + self.stagger * id / 2;
        self.jittered(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delay_is_zero() {
        let mut source = NoDelay;
        assert_eq!(source.processing_delay(0), Duration::ZERO);
        assert_eq!(source.transit_delay(3), Duration::ZERO);
    }

    #[test]
    fn fixed_delay_is_uniform_across_processes() {
        let mut source = FixedDelay::new(Duration::from_millis(5));
        assert_eq!(source.processing_delay(0), source.processing_delay(7));
        assert_eq!(source.transit_delay(2), Duration::from_millis(5));
    }

    #[test]
    fn uniform_delay_staggers_by_process() {
        let mut source = UniformDelay::new(
            Duration::from_millis(100),
            Duration::from_millis(50),
            Duration::from_millis(50),
            Duration::ZERO,
            42,
        );
        assert_eq!(source.processing_delay(0), Duration::from_millis(100));
        assert_eq!(source.processing_delay(2), Duration::from_millis(200));
        assert_eq!(source.transit_delay(2), Duration::from_millis(100));
    }

    #[test]
    fn uniform_delay_is_deterministic_per_seed() {
        let make = || {
            UniformDelay::new(
                Duration::from_millis(10),
                Duration::from_millis(10),
                Duration::from_millis(5),
                Duration::from_millis(20),
                7,
            )
        };
        let mut a = make();
        let mut b = make();
        for id in 0..8 {
            assert_eq!(a.processing_delay(id), b.processing_delay(id));
            assert_eq!(a.transit_delay(id), b.transit_delay(id));
        }
    }

    #[test]
    fn jitter_stays_within_bound() {
        let jitter = Duration::from_millis(30);
        let mut source =
            UniformDelay::new(Duration::ZERO, Duration::ZERO, Duration::ZERO, jitter, 99);
        for _ in 0..100 {
            assert!(source.transit_delay(0) <= jitter);
        }
    }

    #[test]
    fn max_transit_bound_dominates_samples() {
        let mut source = UniformDelay::new(
            Duration::from_millis(50),
            Duration::from_millis(50),
            Duration::from_millis(20),
            Duration::from_millis(40),
            3,
        );
        let bound = source.max_transit_delay(6);
        for id in 0..6 {
            assert!(source.transit_delay(id) <= bound);
        }
    }
}
