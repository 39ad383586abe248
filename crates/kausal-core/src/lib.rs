//! Sans-IO domain logic for the Kausal Lamport clock simulator.
//!
//! This crate holds everything that can be reasoned about without a runtime:
//! the logical clock rules, the message and event types, the communication
//! topology, the swappable delay strategy, and the per-process worker state
//! machine. All I/O (channels, sleeps, logging output) lives in the driver
//! crate (`kausal-sim`), which feeds [`worker::WorkerEvent`]s in and executes
//! the returned [`worker::WorkerAction`]s.
//!
//! ## Architecture
//!
//! ```text
//! kausal-core
//!   ├─ LamportClock    (tick / observe rules)
//!   ├─ Message         (immutable, timestamped at send)
//!   ├─ Topology        (who sends to whom; ring by default)
//!   ├─ DelaySource     (injectable processing/transit latency)
//!   ├─ Environment     (time + randomness abstraction)
//!   └─ ProcessWorker   (event-in, action-out state machine)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod delay;
pub mod env;
pub mod message;
pub mod topology;
pub mod worker;

pub use clock::LamportClock;
pub use delay::{DelaySource, FixedDelay, NoDelay, UniformDelay};
pub use env::Environment;
pub use message::{EventKind, EventRecord, Message, ProcessId};
pub use topology::{Topology, TopologyError};
pub use worker::{ProcessWorker, WorkerAction, WorkerError, WorkerEvent};
