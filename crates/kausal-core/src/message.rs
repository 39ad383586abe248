//! Message and event-trace types.

/// Dense process identifier, `0..N-1`.
pub type ProcessId = u32;

/// A timestamped message between two processes.
///
/// Immutable once constructed: `timestamp` is the sender's clock at the send
/// event and never changes in transit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sending process.
    pub from: ProcessId,
    /// Addressed process.
    pub to: ProcessId,
    /// Sender's Lamport clock at send time.
    pub timestamp: u64,
    /// Application payload (opaque to the clock rules).
    pub payload: String,
}

/// What kind of event a process recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Internal event with no communication.
    Local,
    /// Outgoing message stamped with `timestamp`.
    Send {
        /// Recipient process.
        to: ProcessId,
        /// Stamp attached to the message (the send tick result).
        timestamp: u64,
    },
    /// Incoming message absorbed via the receive rule.
    Receive {
        /// Originating process.
        from: ProcessId,
        /// Stamp the message carried.
        timestamp: u64,
    },
    /// Last event before the worker exits.
    Final,
}

/// One entry in a process's event trace.
///
/// `clock` is the clock value *resulting* from the event. Traces are what
/// the test harness checks the ordering properties against; the runner also
/// logs each record as it is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Process that recorded the event.
    pub process: ProcessId,
    /// Event kind.
    pub kind: EventKind,
    /// Clock value after applying the event.
    pub clock: u64,
}

impl EventRecord {
    /// Short human-readable label for log lines.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            EventKind::Local => "local",
            EventKind::Send { .. } => "send",
            EventKind::Receive { .. } => "receive",
            EventKind::Final => "final",
        }
    }
}
