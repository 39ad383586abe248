//! Message delivery fabric.
//!
//! The mailbox is an explicit channel per process rather than one shared
//! buffer behind a global lock: the router holds a sender for every process
//! and each worker owns the matching [`Inbox`]. Delivery is at-most-once by
//! construction (a message is consumed from its channel exactly once), and
//! the bounded "wait for activity, then drain" pattern becomes a channel
//! receive with a deadline.
//!
//! No guaranteed order across senders - only the Lamport timestamps order
//! events.

use std::time::Duration;

use kausal_core::{Message, ProcessId, Topology};
use tokio::sync::mpsc;

/// Errors routing a message.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// The recipient id has no channel (not part of the topology).
    #[error("no inbox for process {0}")]
    Unaddressed(ProcessId),

    /// The recipient already finished and dropped its inbox.
    ///
    /// This is the lost-message condition: tolerated, logged by the caller.
    #[error("inbox for process {0} is closed")]
    Closed(ProcessId),
}

/// Shared routing half of the delivery fabric.
#[derive(Debug, Clone)]
pub struct Mailbox {
    senders: Vec<mpsc::UnboundedSender<Message>>,
}

impl Mailbox {
    /// Build the fabric for a topology: one channel per process.
    ///
    /// Returns the shared router and each process's private inbox, indexed
    /// by process id.
    #[must_use]
    pub fn for_topology(topology: &Topology) -> (Self, Vec<Inbox>) {
        let mut senders = Vec::with_capacity(topology.len());
        let mut inboxes = Vec::with_capacity(topology.len());

        for id in topology.process_ids() {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            inboxes.push(Inbox { id, rx });
        }

        (Self { senders }, inboxes)
    }

    /// Route a message to its addressed inbox.
    ///
    /// Visible to the recipient as soon as this returns; its pending
    /// `drain` wakes immediately.
    ///
    /// # Errors
    ///
    /// [`MailboxError::Unaddressed`] for recipients outside the topology,
    /// [`MailboxError::Closed`] when the recipient already finished.
    pub fn enqueue(&self, message: Message) -> Result<(), MailboxError> {
        let to = message.to;
        let sender = self.senders.get(to as usize).ok_or(MailboxError::Unaddressed(to))?;
        sender.send(message).map_err(|_| MailboxError::Closed(to))
    }
}

/// Receiving half owned by exactly one worker.
#[derive(Debug)]
pub struct Inbox {
    id: ProcessId,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Inbox {
    /// Process this inbox belongs to.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Wait up to `wait` for activity, then drain everything queued.
    ///
    /// Returns an empty vec if the deadline passes with nothing delivered
    /// (one spent wait cycle for the worker).
    pub async fn drain(&mut self, wait: Duration) -> Vec<Message> {
        let first = match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(message)) => message,
            // Timeout, or all senders dropped (no further delivery possible).
            Ok(None) | Err(_) => return Vec::new(),
        };

        let mut batch = vec![first];
        while let Ok(message) = self.rx.try_recv() {
            batch.push(message);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: ProcessId, to: ProcessId, timestamp: u64) -> Message {
        Message { from, to, timestamp, payload: "hi".into() }
    }

    #[tokio::test]
    async fn routes_to_addressed_inbox_only() {
        let topology = Topology::ring(3).unwrap();
        let (mailbox, mut inboxes) = Mailbox::for_topology(&topology);

        mailbox.enqueue(message(0, 1, 2)).unwrap();

        let delivered = inboxes[1].drain(Duration::from_millis(100)).await;
        assert_eq!(delivered, vec![message(0, 1, 2)]);

        // Nobody else sees it, and it is never delivered twice.
        assert!(inboxes[2].drain(Duration::from_millis(10)).await.is_empty());
        assert!(inboxes[1].drain(Duration::from_millis(10)).await.is_empty());
    }

    #[tokio::test]
    async fn drain_batches_everything_queued() {
        let topology = Topology::ring(4).unwrap();
        let (mailbox, mut inboxes) = Mailbox::for_topology(&topology);

        mailbox.enqueue(message(0, 2, 5)).unwrap();
        mailbox.enqueue(message(1, 2, 3)).unwrap();
        mailbox.enqueue(message(3, 2, 8)).unwrap();

        let delivered = inboxes[2].drain(Duration::from_millis(100)).await;
        assert_eq!(delivered.len(), 3);
    }

    #[tokio::test]
    async fn empty_drain_respects_deadline() {
        let topology = Topology::ring(2).unwrap();
        let (_mailbox, mut inboxes) = Mailbox::for_topology(&topology);

        let start = std::time::Instant::now();
        let delivered = inboxes[0].drain(Duration::from_millis(50)).await;
        assert!(delivered.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn enqueue_to_finished_worker_reports_closed() {
        let topology = Topology::ring(2).unwrap();
        let (mailbox, mut inboxes) = Mailbox::for_topology(&topology);
        drop(inboxes.remove(1));

        assert!(matches!(mailbox.enqueue(message(0, 1, 2)), Err(MailboxError::Closed(1))));
    }

    #[tokio::test]
    async fn enqueue_outside_topology_reports_unaddressed() {
        let topology = Topology::ring(2).unwrap();
        let (mailbox, _inboxes) = Mailbox::for_topology(&topology);

        assert!(matches!(mailbox.enqueue(message(0, 9, 2)), Err(MailboxError::Unaddressed(9))));
    }
}
