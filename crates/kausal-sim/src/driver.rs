//! Simulation driver.
//!
//! Builds the topology and mailbox, spawns one worker task per process,
//! waits for all of them to finish, and reports every process's terminal
//! clock value. No clock logic of its own.

use std::time::Duration;

use kausal_core::{
    DelaySource, Environment, EventRecord, ProcessId, ProcessWorker, Topology, UniformDelay,
};

use crate::{error::SimError, mailbox::Mailbox, runner::WorkerRunner};

/// Simulated latency knobs, all per the classic staggered-delay demo.
#[derive(Debug, Clone, Copy)]
pub struct DelayConfig {
    /// Base pause between the local event and the send.
    pub processing_base: Duration,
    /// Base in-transit delay.
    pub transit_base: Duration,
    /// Extra delay per process id (staggers the processes apart).
    pub stagger: Duration,
    /// Upper bound of uniform random slack added to every delay.
    pub jitter: Duration,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            processing_base: Duration::from_millis(100),
            transit_base: Duration::from_millis(50),
            stagger: Duration::from_millis(50),
            jitter: Duration::from_millis(20),
        }
    }
}

impl DelayConfig {
    /// Zero delay everywhere; used by fast tests.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            processing_base: Duration::ZERO,
            transit_base: Duration::ZERO,
            stagger: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

/// Full configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of simulated processes (ring topology by default).
    pub processes: usize,
    /// Payload attached to every message (opaque to the clock rules).
    pub payload: String,
    /// Deadline of a single mailbox wait.
    pub wait_timeout: Duration,
    /// How many empty waits a worker tolerates before giving up.
    pub wait_cycles: u32,
    /// Simulated latency.
    pub delay: DelayConfig,
    /// RNG seed for the delay jitter; drawn from the environment when
    /// absent. Logged either way so runs can be reproduced.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            processes: 4,
            payload: "hi".to_string(),
            wait_timeout: Duration::from_millis(200),
            wait_cycles: 6,
            delay: DelayConfig::default(),
            seed: None,
        }
    }
}

/// Outcome of one worker: terminal clock plus its full event trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Process id.
    pub id: ProcessId,
    /// Clock value after the final event.
    pub final_clock: u64,
    /// Messages that were addressed to this process but never arrived.
    pub undelivered: usize,
    /// Every event the process recorded, in its own order.
    pub events: Vec<EventRecord>,
}

/// Outcome of a whole run, one report per process, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Seed the delay jitter ran with.
    pub seed: u64,
    /// Per-process outcomes.
    pub workers: Vec<WorkerReport>,
}

impl SimulationReport {
    /// Terminal clock of one process.
    #[must_use]
    pub fn final_clock(&self, id: ProcessId) -> Option<u64> {
        self.workers.iter().find(|w| w.id == id).map(|w| w.final_clock)
    }

    /// All event records across all processes.
    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.workers.iter().flat_map(|w| w.events.iter())
    }

    /// Total messages lost to premature shutdown across the run.
    #[must_use]
    pub fn undelivered(&self) -> usize {
        self.workers.iter().map(|w| w.undelivered).sum()
    }
}

/// One simulation run over an injected environment.
pub struct Simulation<E>
where
    E: Environment,
{
    env: E,
    config: SimulationConfig,
}

impl<E> Simulation<E>
where
    E: Environment,
{
    /// Create a simulation from an environment and configuration.
    pub fn new(env: E, config: SimulationConfig) -> Self {
        Self { env, config }
    }

    /// Run on the default ring topology with seeded randomized delays.
    ///
    /// # Errors
    ///
    /// Returns `SimError` for an invalid process count or a worker failure.
    pub async fn run(&self) -> Result<SimulationReport, SimError> {
        let topology = Topology::ring(self.config.processes)?;
        let seed = self.config.seed.unwrap_or_else(|| self.env.random_u64());
        let delay = self.config.delay;

        self.run_with(&topology, seed, move |id| {
            // Independent stream per process, still reproducible per seed.
            UniformDelay::new(
                delay.processing_base,
                delay.transit_base,
                delay.stagger,
                delay.jitter,
                seed.wrapping_add(u64::from(id)),
            )
        })
        .await
    }

    /// Run on an explicit topology with a caller-chosen delay strategy.
    ///
    /// The factory builds one [`DelaySource`] per process, so tests can
    /// substitute zero or fixed delays.
    ///
    /// # Errors
    ///
    /// Returns `SimError` for topology/worker failures or a panicked task.
    pub async fn run_with<D, F>(
        &self,
        topology: &Topology,
        seed: u64,
        make_delays: F,
    ) -> Result<SimulationReport, SimError>
    where
        D: DelaySource + Send + 'static,
        F: Fn(ProcessId) -> D,
    {
        tracing::info!(
            processes = topology.len(),
            seed,
            wait_timeout_ms = self.config.wait_timeout.as_millis() as u64,
            wait_cycles = self.config.wait_cycles,
            "simulation starting"
        );

        let started = self.env.now();
        let (mailbox, inboxes) = Mailbox::for_topology(topology);
        let mut handles = Vec::with_capacity(topology.len());

        for inbox in inboxes {
            let id = inbox.id();
            let worker =
                ProcessWorker::new(id, topology, &self.config.payload, self.config.wait_cycles)?;
            let runner = WorkerRunner::new(
                worker,
                inbox,
                mailbox.clone(),
                self.env.clone(),
                make_delays(id),
                self.config.wait_timeout,
            );
            handles.push(tokio::spawn(runner.run()));
        }

        // Workers hold their own router clones; dropping ours lets channels
        // close as their owners finish.
        drop(mailbox);

        let mut workers = Vec::with_capacity(handles.len());
        for handle in handles {
            workers.push(handle.await??);
        }
        workers.sort_by_key(|w| w.id);

        let elapsed = self.env.now() - started;
        tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "final clocks:");
        for worker in &workers {
            tracing::info!(process = worker.id, clock = worker.final_clock, "final clock");
        }
        let undelivered: usize = workers.iter().map(|w| w.undelivered).sum();
        if undelivered > 0 {
            tracing::warn!(undelivered, "run finished with lost messages");
        }

        Ok(SimulationReport { seed, workers })
    }
}

#[cfg(test)]
mod tests {
    use kausal_core::NoDelay;

    use super::*;
    use crate::system_env::SystemEnv;

    fn fast_config(processes: usize) -> SimulationConfig {
        SimulationConfig {
            processes,
            delay: DelayConfig::zero(),
            wait_timeout: Duration::from_millis(20),
            ..SimulationConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ring_run_produces_one_report_per_process() {
        let sim = Simulation::new(SystemEnv::new(), fast_config(4));
        let report = sim.run().await.unwrap();

        assert_eq!(report.workers.len(), 4);
        for (i, worker) in report.workers.iter().enumerate() {
            assert_eq!(worker.id as usize, i);
            // local + send + receive + final for every ring member.
            assert_eq!(worker.events.len(), 4);
        }
        assert_eq!(report.undelivered(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn explicit_topology_and_delay_strategy() {
        let config = fast_config(4);
        let sim = Simulation::new(SystemEnv::new(), config);
        let topology = Topology::from_targets(vec![1, 0, 0, 0]).unwrap();

        let report = sim.run_with(&topology, 7, |_| NoDelay).await.unwrap();

        // Process 0 receives three messages, 2 and 3 receive none.
        assert_eq!(report.workers[0].events.len(), 6);
        assert_eq!(report.workers[2].events.len(), 3);
        assert_eq!(report.undelivered(), 0);
    }

    #[tokio::test]
    async fn rejects_degenerate_process_count() {
        let sim = Simulation::new(SystemEnv::new(), fast_config(1));
        assert!(matches!(sim.run().await, Err(SimError::Topology(_))));
    }
}
