//! Communication topology.
//!
//! Each process sends exactly one message. The topology records who it sends
//! to, and — derived from that — how many messages each process should
//! expect, which is what lets a worker leave its receive loop without a
//! guessed iteration count.

use crate::message::ProcessId;

/// Errors constructing a topology.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A topology needs at least two processes to exchange messages.
    #[error("topology needs at least 2 processes, got {0}")]
    TooFewProcesses(usize),

    /// A target referred to a process outside `0..N`.
    #[error("process {from} targets {to}, but only {count} processes exist")]
    TargetOutOfRange {
        /// Sending process.
        from: ProcessId,
        /// Invalid target.
        to: ProcessId,
        /// Number of processes in the topology.
        count: usize,
    },

    /// A process addressed itself; self-sends carry no causal information.
    #[error("process {0} targets itself")]
    SelfTarget(ProcessId),
}

/// Fixed communication graph: `targets[i]` receives process `i`'s message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    targets: Vec<ProcessId>,
}

impl Topology {
    /// Ring topology: `i` sends to `(i + 1) mod n`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::TooFewProcesses`] for `n < 2`.
    pub fn ring(n: usize) -> Result<Self, TopologyError> {
        if n < 2 {
            return Err(TopologyError::TooFewProcesses(n));
        }
        #[allow(clippy::cast_possible_truncation)]
        let targets = (0..n).map(|i| ((i + 1) % n) as ProcessId).collect();
        Ok(Self { targets })
    }

    /// Arbitrary one-message-per-process graph.
    ///
    /// # Errors
    ///
    /// Rejects graphs with fewer than two processes, out-of-range targets,
    /// or self-sends.
    pub fn from_targets(targets: Vec<ProcessId>) -> Result<Self, TopologyError> {
        if targets.len() < 2 {
            return Err(TopologyError::TooFewProcesses(targets.len()));
        }
        for (i, &to) in targets.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let from = i as ProcessId;
            if to as usize >= targets.len() {
                return Err(TopologyError::TargetOutOfRange { from, to, count: targets.len() });
            }
            if to == from {
                return Err(TopologyError::SelfTarget(from));
            }
        }
        Ok(Self { targets })
    }

    /// Number of processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if the topology is empty (cannot happen for validated values).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Recipient of `id`'s single message.
    #[must_use]
    pub fn target(&self, id: ProcessId) -> Option<ProcessId> {
        self.targets.get(id as usize).copied()
    }

    /// How many messages are addressed to `id`.
    #[must_use]
    pub fn expected_inbound(&self, id: ProcessId) -> usize {
        self.targets.iter().filter(|&&to| to == id).count()
    }

    /// Iterator over all process ids.
    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.targets.len() as ProcessId;
        0..count
    }
}
