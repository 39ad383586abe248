//! Kausal simulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Default: 4 processes in a ring, randomized staggered delays
//! kausal-sim
//!
//! # Reproducible run with more processes
//! kausal-sim --processes 8 --seed 42
//! ```

use std::time::Duration;

use clap::Parser;
use kausal_sim::{DelayConfig, Simulation, SimulationConfig, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Lamport logical clock simulator
#[derive(Parser, Debug)]
#[command(name = "kausal-sim")]
#[command(about = "Simulates Lamport clocks across concurrent processes")]
#[command(version)]
struct Args {
    /// Number of simulated processes (ring topology)
    #[arg(short, long, default_value = "4")]
    processes: usize,

    /// Payload attached to every message
    #[arg(long, default_value = "hi")]
    payload: String,

    /// Seed for the delay jitter (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Deadline of a single mailbox wait, in milliseconds
    #[arg(long, default_value = "200")]
    wait_timeout_ms: u64,

    /// Empty mailbox waits tolerated before a process gives up
    #[arg(long, default_value = "6")]
    wait_cycles: u32,

    /// Base processing pause before the send, in milliseconds
    #[arg(long, default_value = "100")]
    processing_ms: u64,

    /// Base in-transit delay, in milliseconds
    #[arg(long, default_value = "50")]
    transit_ms: u64,

    /// Per-process delay stagger step, in milliseconds
    #[arg(long, default_value = "50")]
    stagger_ms: u64,

    /// Random slack added to every delay, up to this bound, in milliseconds
    #[arg(long, default_value = "20")]
    jitter_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = SimulationConfig {
        processes: args.processes,
        payload: args.payload,
        wait_timeout: Duration::from_millis(args.wait_timeout_ms),
        wait_cycles: args.wait_cycles,
        delay: DelayConfig {
            processing_base: Duration::from_millis(args.processing_ms),
            transit_base: Duration::from_millis(args.transit_ms),
            stagger: Duration::from_millis(args.stagger_ms),
            jitter: Duration::from_millis(args.jitter_ms),
        },
        seed: args.seed,
    };

    let simulation = Simulation::new(SystemEnv::new(), config);
    simulation.run().await?;

    Ok(())
}
