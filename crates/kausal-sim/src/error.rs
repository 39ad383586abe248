//! Simulation-level errors.

use kausal_core::{ProcessId, TopologyError, WorkerError};

use crate::mailbox::MailboxError;

/// Fatal errors for a simulation run.
///
/// There is no supervisory restart: any worker failure terminates the whole
/// run with a nonzero exit.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The requested topology is invalid.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// A worker state machine rejected an event (driver bug).
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// A message could not be routed (recipient outside the topology).
    #[error("mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    /// A worker stopped producing events without reaching its final event.
    #[error("worker {0} stalled without finishing")]
    Stalled(ProcessId),

    /// A spawned worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
