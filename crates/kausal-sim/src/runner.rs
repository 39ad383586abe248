//! Worker action executor.
//!
//! One runner drives one `ProcessWorker`: it executes the actions the state
//! machine returns (sleeping out simulated delays, enqueueing messages,
//! waiting on the inbox) and feeds the resulting events back in until the
//! worker finishes. All suspension points live here; the state machine
//! itself never blocks.

use std::{collections::VecDeque, time::Duration};

use kausal_core::{
    DelaySource, Environment, EventKind, EventRecord, ProcessWorker, WorkerAction, WorkerEvent,
};

use crate::{
    driver::WorkerReport,
    error::SimError,
    mailbox::{Inbox, Mailbox, MailboxError},
};

/// Drives a single worker to completion.
pub struct WorkerRunner<E, D>
where
    E: Environment,
    D: DelaySource,
{
    worker: ProcessWorker,
    inbox: Inbox,
    mailbox: Mailbox,
    env: E,
    delays: D,
    wait_timeout: Duration,
}

impl<E, D> WorkerRunner<E, D>
where
    E: Environment,
    D: DelaySource,
{
    /// Pair a worker with its inbox, the shared router, and a delay source.
    pub fn new(
        worker: ProcessWorker,
        inbox: Inbox,
        mailbox: Mailbox,
        env: E,
        delays: D,
        wait_timeout: Duration,
    ) -> Self {
        Self { worker, inbox, mailbox, env, delays, wait_timeout }
    }

    /// Run the worker to its final event and return its report.
    ///
    /// # Errors
    ///
    /// Returns `SimError` on worker protocol violations or routing to a
    /// process outside the topology. A closed recipient inbox is NOT an
    /// error: the message is logged as lost and the run continues.
    pub async fn run(mut self) -> Result<WorkerReport, SimError> {
        let id = self.worker.id();
        let mut events = VecDeque::from([WorkerEvent::Start]);
        let mut trace = Vec::new();

        while let Some(event) = events.pop_front() {
            let actions = self.worker.handle(event)?;

            for action in actions {
                match action {
                    WorkerAction::Record(record) => {
                        log_record(&record);
                        trace.push(record);
                    },

                    WorkerAction::Pause => {
                        let delay = self.delays.processing_delay(id);
                        self.env.sleep(delay).await;
                        events.push_back(WorkerEvent::PauseElapsed);
                    },

                    WorkerAction::Transmit(message) => {
                        // In-transit delay happens before the message becomes
                        // visible; the stamp was fixed at the send tick.
                        let delay = self.delays.transit_delay(id);
                        self.env.sleep(delay).await;

                        match self.mailbox.enqueue(message) {
                            Ok(()) => {},
                            Err(MailboxError::Closed(to)) => {
                                tracing::warn!(
                                    process = id,
                                    to,
                                    "message lost: recipient already finished"
                                );
                            },
                            Err(e @ MailboxError::Unaddressed(_)) => return Err(e.into()),
                        }
                    },

                    WorkerAction::AwaitMailbox => {
                        let batch = self.inbox.drain(self.wait_timeout).await;
                        if batch.is_empty() {
                            events.push_back(WorkerEvent::WaitTimedOut);
                        } else {
                            events.extend(batch.into_iter().map(WorkerEvent::Delivered));
                        }
                    },

                    WorkerAction::Finished { final_clock } => {
                        let undelivered = self.worker.outstanding_inbound();
                        if undelivered > 0 {
                            tracing::warn!(
                                process = id,
                                undelivered,
                                "finished with undelivered messages"
                            );
                        }
                        return Ok(WorkerReport { id, final_clock, undelivered, events: trace });
                    },
                }
            }
        }

        Err(SimError::Stalled(id))
    }
}

/// One log line per event: process id, kind, resulting clock.
fn log_record(record: &EventRecord) {
    match record.kind {
        EventKind::Local => {
            tracing::info!(process = record.process, clock = record.clock, "local event");
        },
        EventKind::Send { to, timestamp } => {
            tracing::info!(
                process = record.process,
                to,
                timestamp,
                clock = record.clock,
                "send event"
            );
        },
        EventKind::Receive { from, timestamp } => {
            tracing::info!(
                process = record.process,
                from,
                timestamp,
                clock = record.clock,
                "receive event"
            );
        },
        EventKind::Final => {
            tracing::info!(process = record.process, clock = record.clock, "final event");
        },
    }
}
