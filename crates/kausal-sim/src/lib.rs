//! Kausal simulation runtime.
//!
//! This crate turns the sans-IO state machines from `kausal-core` into a
//! running simulation:
//! - Tokio for the multi-thread runtime (one task per simulated process)
//! - mpsc channels as the message delivery fabric
//! - System time and OS randomness
//!
//! ## Architecture
//!
//! ```text
//! kausal-sim
//!   ├─ SystemEnv     (production Environment impl)
//!   ├─ Mailbox       (per-process channels + deadline waits)
//!   ├─ WorkerRunner  (executes WorkerActions, feeds WorkerEvents)
//!   └─ Simulation    (spawns workers, joins, final report)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod mailbox;
mod runner;
mod system_env;

pub use driver::{DelayConfig, Simulation, SimulationConfig, SimulationReport, WorkerReport};
pub use error::SimError;
pub use mailbox::{Inbox, Mailbox, MailboxError};
pub use runner::WorkerRunner;
pub use system_env::SystemEnv;
