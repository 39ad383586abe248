//! Ordering-property checks over simulation reports.
//!
//! Each check walks the collected event traces and verifies one of the
//! Lamport guarantees. Checks return `Err(reason)` rather than panicking so
//! both plain tests and proptest closures can assert on them.

use kausal_core::{EventKind, ProcessId};
use kausal_sim::SimulationReport;

/// Every process's recorded clock values strictly increase.
pub fn monotonic(report: &SimulationReport) -> Result<(), String> {
    for worker in &report.workers {
        let mut previous = 0u64;
        for event in &worker.events {
            if event.clock <= previous {
                return Err(format!(
                    "process {}: clock went {} -> {} on a {} event",
                    worker.id,
                    previous,
                    event.clock,
                    event.kind_label()
                ));
            }
            previous = event.clock;
        }
    }
    Ok(())
}

/// Every receive event's clock equals `max(previous, timestamp) + 1`.
pub fn receive_rule(report: &SimulationReport) -> Result<(), String> {
    for worker in &report.workers {
        let mut previous = 0u64;
        for event in &worker.events {
            if let EventKind::Receive { from, timestamp } = event.kind {
                let expected = previous.max(timestamp) + 1;
                if event.clock != expected {
                    return Err(format!(
                        "process {}: receive from {} (ts={}) with prior clock {} \
                         produced {}, expected {}",
                        worker.id, from, timestamp, previous, event.clock, expected
                    ));
                }
            }
            previous = event.clock;
        }
    }
    Ok(())
}

/// Every matched send/receive pair satisfies `send stamp < receive clock`.
pub fn causal_order(report: &SimulationReport) -> Result<(), String> {
    for (sender, to, timestamp) in sends(report) {
        for (receiver, from, received_ts, clock) in receives(report) {
            if receiver == to && from == sender && received_ts == timestamp && clock <= timestamp {
                return Err(format!(
                    "send {sender}->{to} stamped {timestamp} but matching receive clocked {clock}"
                ));
            }
        }
    }
    Ok(())
}

/// No message is observed by more than one receive event.
///
/// Each process sends exactly one message, so the sender id identifies the
/// message.
pub fn at_most_once(report: &SimulationReport) -> Result<(), String> {
    let mut seen: Vec<ProcessId> = Vec::new();
    for (receiver, from, _ts, _clock) in receives(report) {
        if seen.contains(&from) {
            return Err(format!(
                "message from {from} delivered more than once (last to process {receiver})"
            ));
        }
        seen.push(from);
    }
    Ok(())
}

/// Every sent message was received before its destination finished.
pub fn no_loss(report: &SimulationReport) -> Result<(), String> {
    if report.undelivered() > 0 {
        return Err(format!("{} messages undelivered", report.undelivered()));
    }
    for (sender, to, timestamp) in sends(report) {
        let matched = receives(report)
            .any(|(receiver, from, ts, _)| receiver == to && from == sender && ts == timestamp);
        if !matched {
            return Err(format!("send {sender}->{to} (ts={timestamp}) has no matching receive"));
        }
    }
    Ok(())
}

/// All ordering properties at once.
pub fn all(report: &SimulationReport) -> Result<(), String> {
    monotonic(report)?;
    receive_rule(report)?;
    causal_order(report)?;
    at_most_once(report)?;
    Ok(())
}

/// (sender, recipient, stamp) for every send event.
fn sends(report: &SimulationReport) -> impl Iterator<Item = (ProcessId, ProcessId, u64)> + '_ {
    report.events().filter_map(|e| match e.kind {
        EventKind::Send { to, timestamp } => Some((e.process, to, timestamp)),
        _ => None,
    })
}

/// (receiver, sender, stamp, resulting clock) for every receive event.
fn receives(
    report: &SimulationReport,
) -> impl Iterator<Item = (ProcessId, ProcessId, u64, u64)> + '_ {
    report.events().filter_map(|e| match e.kind {
        EventKind::Receive { from, timestamp } => Some((e.process, from, timestamp, e.clock)),
        _ => None,
    })
}
