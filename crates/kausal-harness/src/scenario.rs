//! Scenario builder.
//!
//! Wraps a full simulation run behind a synchronous builder so property
//! tests and integration tests can configure and run simulations without
//! writing async plumbing. Every scenario is seeded and therefore
//! reproducible.

use std::time::Duration;

use kausal_core::{FixedDelay, NoDelay, Topology, UniformDelay};
use kausal_sim::{DelayConfig, SimError, Simulation, SimulationConfig, SimulationReport};

use crate::test_env::TestEnv;

/// Errors running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The tokio runtime could not be built.
    #[error("runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The simulation itself failed.
    #[error(transparent)]
    Sim(#[from] SimError),
}

#[derive(Debug, Clone, Copy)]
enum DelayMode {
    Zero,
    Fixed(Duration),
    Randomized(DelayConfig),
}

/// Builder for one reproducible simulation run.
///
/// Defaults: 4 processes in a ring, zero delay, 20 ms wait deadline,
/// 6 wait cycles, seed 0.
#[derive(Debug, Clone)]
pub struct Scenario {
    processes: usize,
    topology: Option<Topology>,
    seed: u64,
    delay: DelayMode,
    wait_timeout: Duration,
    wait_cycles: u32,
    payload: String,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Fresh scenario with fast-test defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processes: 4,
            topology: None,
            seed: 0,
            delay: DelayMode::Zero,
            wait_timeout: Duration::from_millis(20),
            wait_cycles: 6,
            payload: "hi".to_string(),
        }
    }

    /// Ring topology over `n` processes.
    #[must_use]
    pub fn with_processes(mut self, n: usize) -> Self {
        self.processes = n;
        self
    }

    /// Explicit topology (overrides the process count).
    #[must_use]
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Seed for the environment and the delay jitter.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The same fixed delay for every pause and transit.
    #[must_use]
    pub fn with_fixed_delay(mut self, delay: Duration) -> Self {
        self.delay = DelayMode::Fixed(delay);
        self
    }

    /// Seeded randomized delays with the given knobs.
    #[must_use]
    pub fn with_randomized_delay(mut self, config: DelayConfig) -> Self {
        self.delay = DelayMode::Randomized(config);
        self
    }

    /// Mailbox wait deadline and budget.
    #[must_use]
    pub fn with_wait(mut self, timeout: Duration, cycles: u32) -> Self {
        self.wait_timeout = timeout;
        self.wait_cycles = cycles;
        self
    }

    /// Message payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Run the scenario to completion and return the report.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the runtime cannot be built, the
    /// topology is invalid, or a worker fails.
    pub fn run(&self) -> Result<SimulationReport, ScenarioError> {
        let topology = match &self.topology {
            Some(t) => t.clone(),
            None => Topology::ring(self.processes).map_err(SimError::from)?,
        };

        let config = SimulationConfig {
            processes: topology.len(),
            payload: self.payload.clone(),
            wait_timeout: self.wait_timeout,
            wait_cycles: self.wait_cycles,
            delay: DelayConfig::zero(),
            seed: Some(self.seed),
        };
        let sim = Simulation::new(TestEnv::seeded(self.seed), config);
        let seed = self.seed;

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_time().build()?;

        let report = match self.delay {
            DelayMode::Zero => runtime.block_on(sim.run_with(&topology, seed, |_| NoDelay))?,
            DelayMode::Fixed(delay) => {
                runtime.block_on(sim.run_with(&topology, seed, move |_| FixedDelay::new(delay)))?
            },
            DelayMode::Randomized(delay) => {
                runtime.block_on(sim.run_with(&topology, seed, move |id| {
                    UniformDelay::new(
                        delay.processing_base,
                        delay.transit_base,
                        delay.stagger,
                        delay.jitter,
                        seed.wrapping_add(u64::from(id)),
                    )
                }))?
            },
        };

        Ok(report)
    }
}
