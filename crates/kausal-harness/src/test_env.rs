//! Seeded test environment.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use kausal_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic environment for tests.
///
/// Time and sleeping are real (delays in tests are zero or tiny), but all
/// randomness comes from a seeded `ChaCha8` stream so every derived value -
/// in particular per-process delay seeds - is reproducible.
#[derive(Clone)]
pub struct TestEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl TestEnv {
    /// Create an environment with a fixed RNG seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Environment for TestEnv {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        match self.rng.lock() {
            Ok(mut rng) => rng.fill_bytes(buffer),
            // A poisoned lock means a test already panicked; zeros keep the
            // remaining teardown deterministic.
            Err(_) => buffer.fill(0),
        }
    }
}
