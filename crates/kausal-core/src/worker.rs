//! Per-process worker state machine.
//!
//! `ProcessWorker` is a pure state machine - it consumes [`WorkerEvent`]s
//! and returns [`WorkerAction`]s, and the runner in `kausal-sim` performs
//! the actual sleeping, sending, and mailbox waiting. The worker owns its
//! Lamport clock exclusively; nothing else reads or writes it.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──Start──▶ Pausing ──PauseElapsed──▶ Receiving ──▶ Done
//!  (local event)   (send event)              (receive loop, then
//!                                             final event)
//! ```
//!
//! The receive loop ends when the worker has observed every message the
//! topology addresses to it. A bounded wait-cycle budget is kept as a
//! fallback so a worker whose message was genuinely lost still terminates
//! instead of waiting forever.

use crate::{
    clock::LamportClock,
    message::{EventKind, EventRecord, Message, ProcessId},
    topology::Topology,
};

/// Inputs fed to the worker by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The simulation started; perform the initial local event.
    Start,
    /// The processing pause requested by [`WorkerAction::Pause`] elapsed.
    PauseElapsed,
    /// A message addressed to this worker arrived.
    Delivered(Message),
    /// The mailbox wait requested by [`WorkerAction::AwaitMailbox`] timed
    /// out with nothing delivered.
    WaitTimedOut,
}

impl WorkerEvent {
    fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::PauseElapsed => "pause-elapsed",
            Self::Delivered(_) => "delivered",
            Self::WaitTimedOut => "wait-timed-out",
        }
    }
}

/// Outputs for the runner to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerAction {
    /// Log and collect this event record.
    Record(EventRecord),
    /// Suspend for the processing delay, then feed
    /// [`WorkerEvent::PauseElapsed`].
    Pause,
    /// Apply the transit delay, then enqueue the message into the mailbox.
    Transmit(Message),
    /// Wait on the mailbox with the configured deadline, then feed either
    /// [`WorkerEvent::Delivered`] per message or [`WorkerEvent::WaitTimedOut`].
    AwaitMailbox,
    /// The worker reached its final event and exits.
    Finished {
        /// Terminal clock value for the final report.
        final_clock: u64,
    },
}

/// Worker protocol violations. These indicate a driver bug, not a
/// simulation outcome, and abort the run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkerError {
    /// The topology has no entry for this process.
    #[error("process {0} is not part of the topology")]
    UnknownProcess(ProcessId),

    /// An event arrived that is invalid in the current phase.
    #[error("process {process}: unexpected event {event} in phase {phase}")]
    UnexpectedEvent {
        /// Worker the event was fed to.
        process: ProcessId,
        /// Phase the worker was in.
        phase: &'static str,
        /// Event that was fed.
        event: &'static str,
    },

    /// A message for another recipient was delivered to this worker.
    #[error("process {recipient} was handed a message addressed to {addressed_to}")]
    Misaddressed {
        /// Worker that received the message.
        recipient: ProcessId,
        /// Recipient the message names.
        addressed_to: ProcessId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pausing,
    Receiving,
    Done,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pausing => "pausing",
            Self::Receiving => "receiving",
            Self::Done => "done",
        }
    }
}

/// One simulated process: local event, one send, receive loop, final event.
#[derive(Debug)]
pub struct ProcessWorker {
    id: ProcessId,
    target: ProcessId,
    payload: String,
    clock: LamportClock,
    phase: Phase,
    expected_inbound: usize,
    received: usize,
    wait_budget: u32,
}

impl ProcessWorker {
    /// Build a worker for `id` from the shared topology.
    ///
    /// `wait_budget` bounds how many empty mailbox waits the worker tolerates
    /// before giving up on undelivered messages.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::UnknownProcess`] if `id` is outside the
    /// topology.
    pub fn new(
        id: ProcessId,
        topology: &Topology,
        payload: impl Into<String>,
        wait_budget: u32,
    ) -> Result<Self, WorkerError> {
        let target = topology.target(id).ok_or(WorkerError::UnknownProcess(id))?;
        Ok(Self {
            id,
            target,
            payload: payload.into(),
            clock: LamportClock::new(),
            phase: Phase::Idle,
            expected_inbound: topology.expected_inbound(id),
            received: 0,
            wait_budget,
        })
    }

    /// This worker's process id.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Current clock reading.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock.value()
    }

    /// True once the final event has run.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Messages still expected but not yet delivered.
    #[must_use]
    pub fn outstanding_inbound(&self) -> usize {
        self.expected_inbound.saturating_sub(self.received)
    }

    /// Process an event and return the resulting actions.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] for events that violate the worker protocol.
    pub fn handle(&mut self, event: WorkerEvent) -> Result<Vec<WorkerAction>, WorkerError> {
        tracing::trace!(process = self.id, phase = self.phase.label(), event = event.label());

        match (self.phase, event) {
            (Phase::Idle, WorkerEvent::Start) => Ok(self.start()),
            (Phase::Pausing, WorkerEvent::PauseElapsed) => Ok(self.send()),
            (Phase::Receiving, WorkerEvent::Delivered(message)) => self.receive(&message),
            (Phase::Receiving, WorkerEvent::WaitTimedOut) => Ok(self.wait_timed_out()),
            (phase, event) => Err(WorkerError::UnexpectedEvent {
                process: self.id,
                phase: phase.label(),
                event: event.label(),
            }),
        }
    }

    /// Initial local event, then pause before sending.
    fn start(&mut self) -> Vec<WorkerAction> {
        let clock = self.clock.tick();
        self.phase = Phase::Pausing;
        vec![self.record(EventKind::Local, clock), WorkerAction::Pause]
    }

    /// Send event: stamp the outgoing message with the tick result.
    ///
    /// The stamp is fixed here and never changes in transit, so the matching
    /// receive is guaranteed to compute a strictly larger value.
    fn send(&mut self) -> Vec<WorkerAction> {
        let timestamp = self.clock.tick();
        let message = Message {
            from: self.id,
            to: self.target,
            timestamp,
            payload: self.payload.clone(),
        };

        let mut actions = vec![
            self.record(EventKind::Send { to: self.target, timestamp }, timestamp),
            WorkerAction::Transmit(message),
        ];

        if self.received >= self.expected_inbound {
            // Nothing is addressed to us; skip the receive loop entirely.
            actions.extend(self.finish());
        } else {
            self.phase = Phase::Receiving;
            actions.push(WorkerAction::AwaitMailbox);
        }
        actions
    }

    /// Receive event: apply the Lamport rule to the incoming stamp.
    fn receive(&mut self, message: &Message) -> Result<Vec<WorkerAction>, WorkerError> {
        if message.to != self.id {
            return Err(WorkerError::Misaddressed {
                recipient: self.id,
                addressed_to: message.to,
            });
        }

        let clock = self.clock.observe(message.timestamp);
        self.received += 1;

        let mut actions = vec![self.record(
            EventKind::Receive { from: message.from, timestamp: message.timestamp },
            clock,
        )];

        if self.received >= self.expected_inbound {
            actions.extend(self.finish());
        } else {
            actions.push(WorkerAction::AwaitMailbox);
        }
        Ok(actions)
    }

    /// An empty mailbox wait elapsed; spend one budget cycle.
    fn wait_timed_out(&mut self) -> Vec<WorkerAction> {
        self.wait_budget = self.wait_budget.saturating_sub(1);
        if self.wait_budget == 0 {
            // Undelivered messages are an accepted simulation outcome, not a
            // crash; the runner reports them from `outstanding_inbound`.
            self.finish()
        } else {
            vec![WorkerAction::AwaitMailbox]
        }
    }

    /// Final local event, then exit.
    fn finish(&mut self) -> Vec<WorkerAction> {
        let clock = self.clock.tick();
        self.phase = Phase::Done;
        vec![
            self.record(EventKind::Final, clock),
            WorkerAction::Finished { final_clock: clock },
        ]
    }

    fn record(&self, kind: EventKind, clock: u64) -> WorkerAction {
        WorkerAction::Record(EventRecord { process: self.id, kind, clock })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_worker(id: ProcessId, n: usize, budget: u32) -> ProcessWorker {
        let topology = Topology::ring(n).unwrap();
        ProcessWorker::new(id, &topology, "hi", budget).unwrap()
    }

    fn records(actions: &[WorkerAction]) -> Vec<EventRecord> {
        actions
            .iter()
            .filter_map(|a| match a {
                WorkerAction::Record(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_runs_local_event_then_pauses() {
        let mut worker = ring_worker(0, 4, 6);
        let actions = worker.handle(WorkerEvent::Start).unwrap();

        assert_eq!(
            records(&actions),
            vec![EventRecord { process: 0, kind: EventKind::Local, clock: 1 }]
        );
        assert_eq!(actions.last(), Some(&WorkerAction::Pause));
        assert_eq!(worker.clock(), 1);
    }

    #[test]
    fn send_stamps_with_tick_result() {
        let mut worker = ring_worker(0, 4, 6);
        worker.handle(WorkerEvent::Start).unwrap();
        let actions = worker.handle(WorkerEvent::PauseElapsed).unwrap();

        let expected = Message { from: 0, to: 1, timestamp: 2, payload: "hi".into() };
        assert!(actions.contains(&WorkerAction::Transmit(expected)));
        assert_eq!(actions.last(), Some(&WorkerAction::AwaitMailbox));
    }

    #[test]
    fn receive_applies_lamport_rule() {
        let mut worker = ring_worker(1, 4, 6);
        worker.handle(WorkerEvent::Start).unwrap();
        worker.handle(WorkerEvent::PauseElapsed).unwrap();
        assert_eq!(worker.clock(), 2);

        let message = Message { from: 0, to: 1, timestamp: 9, payload: "hi".into() };
        let actions = worker.handle(WorkerEvent::Delivered(message)).unwrap();

        // max(2, 9) + 1 = 10, then the final event ticks to 11.
        let recs = records(&actions);
        assert_eq!(recs[0].clock, 10);
        assert_eq!(recs[0].kind, EventKind::Receive { from: 0, timestamp: 9 });
        assert_eq!(recs[1].kind, EventKind::Final);
        assert_eq!(recs[1].clock, 11);
        assert!(actions.contains(&WorkerAction::Finished { final_clock: 11 }));
        assert!(worker.is_done());
    }

    #[test]
    fn receive_with_stale_stamp_still_advances() {
        let mut worker = ring_worker(1, 4, 6);
        worker.handle(WorkerEvent::Start).unwrap();
        worker.handle(WorkerEvent::PauseElapsed).unwrap();

        let message = Message { from: 0, to: 1, timestamp: 1, payload: "hi".into() };
        let actions = worker.handle(WorkerEvent::Delivered(message)).unwrap();

        // max(2, 1) + 1 = 3.
        assert_eq!(records(&actions)[0].clock, 3);
    }

    #[test]
    fn exhausted_wait_budget_finishes_without_delivery() {
        let mut worker = ring_worker(2, 4, 2);
        worker.handle(WorkerEvent::Start).unwrap();
        worker.handle(WorkerEvent::PauseElapsed).unwrap();

        let actions = worker.handle(WorkerEvent::WaitTimedOut).unwrap();
        assert_eq!(actions, vec![WorkerAction::AwaitMailbox]);

        let actions = worker.handle(WorkerEvent::WaitTimedOut).unwrap();
        assert!(actions.iter().any(|a| matches!(a, WorkerAction::Finished { .. })));
        assert!(worker.is_done());
        assert_eq!(worker.outstanding_inbound(), 1);
    }

    #[test]
    fn fan_in_waits_for_all_expected_messages() {
        // 1, 2 and 3 all send to 0; 0 sends to 1.
        let topology = Topology::from_targets(vec![1, 0, 0, 0]).unwrap();
        let mut worker = ProcessWorker::new(0, &topology, "hi", 6).unwrap();
        worker.handle(WorkerEvent::Start).unwrap();
        worker.handle(WorkerEvent::PauseElapsed).unwrap();

        for from in [1u32, 2] {
            let message = Message { from, to: 0, timestamp: 2, payload: "hi".into() };
            let actions = worker.handle(WorkerEvent::Delivered(message)).unwrap();
            assert_eq!(actions.last(), Some(&WorkerAction::AwaitMailbox));
        }

        let message = Message { from: 3, to: 0, timestamp: 2, payload: "hi".into() };
        let actions = worker.handle(WorkerEvent::Delivered(message)).unwrap();
        assert!(actions.iter().any(|a| matches!(a, WorkerAction::Finished { .. })));
    }

    #[test]
    fn no_inbound_skips_receive_loop() {
        // Process 2 receives nothing in this graph.
        let topology = Topology::from_targets(vec![1, 0, 0, 0]).unwrap();
        let mut worker = ProcessWorker::new(2, &topology, "hi", 6).unwrap();
        worker.handle(WorkerEvent::Start).unwrap();
        let actions = worker.handle(WorkerEvent::PauseElapsed).unwrap();

        assert!(!actions.contains(&WorkerAction::AwaitMailbox));
        assert!(actions.iter().any(|a| matches!(a, WorkerAction::Finished { .. })));
    }

    #[test]
    fn misaddressed_delivery_is_an_error() {
        let mut worker = ring_worker(1, 4, 6);
        worker.handle(WorkerEvent::Start).unwrap();
        worker.handle(WorkerEvent::PauseElapsed).unwrap();

        let message = Message { from: 0, to: 3, timestamp: 2, payload: "hi".into() };
        assert_eq!(
            worker.handle(WorkerEvent::Delivered(message)),
            Err(WorkerError::Misaddressed { recipient: 1, addressed_to: 3 })
        );
    }

    #[test]
    fn events_out_of_phase_are_errors() {
        let mut worker = ring_worker(0, 4, 6);
        assert_eq!(
            worker.handle(WorkerEvent::PauseElapsed),
            Err(WorkerError::UnexpectedEvent {
                process: 0,
                phase: "idle",
                event: "pause-elapsed"
            })
        );

        worker.handle(WorkerEvent::Start).unwrap();
        assert!(matches!(
            worker.handle(WorkerEvent::Start),
            Err(WorkerError::UnexpectedEvent { phase: "pausing", .. })
        ));
    }

    #[test]
    fn unknown_process_rejected_at_construction() {
        let topology = Topology::ring(3).unwrap();
        assert!(matches!(
            ProcessWorker::new(7, &topology, "hi", 6),
            Err(WorkerError::UnknownProcess(7))
        ));
    }
}
