//! Partition fan-out: one fetch task per status, results drained on the caller's
//! thread in completion order.

use crate::ticket::{Status, Ticket};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of one partition fetch, as it arrives on the result queue.
pub struct PartitionResult {
    pub status: Status,
    pub result: Result<Vec<Ticket>>,
}

/// Which partitions made it into the cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub completed: Vec<Status>,
    pub failed: Vec<Status>,
    pub timed_out: Vec<Status>,
}

impl FanOutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }
}

/// Launch `fetch` for every status at once and call `reduce` once per
/// successfully fetched partition, in arrival order.
///
/// - A failed fetch is logged and skipped; the other partitions continue.
/// - A `reduce` error stops the drain and is returned.
/// - `reduce` only ever runs on the calling thread, so invocations never overlap.
/// - With a `deadline`, partitions still outstanding when it passes are
///   reported as timed out and their late results are discarded.
pub fn fan_out<F, R>(statuses: &[Status], deadline: Option<Duration>, fetch: F, mut reduce: R) -> Result<FanOutReport>
where
    F: Fn(Status) -> Result<Vec<Ticket>> + Send + Sync + 'static,
    R: FnMut(Status, Vec<Ticket>) -> Result<()>,
{
    let mut unique = statuses.to_vec();
    unique.sort();
    unique.dedup();

    let mut report = FanOutReport::default();
    if unique.is_empty() {
        return Ok(report);
    }

    let (tx, rx) = mpsc::sync_channel::<PartitionResult>(unique.len());
    let fetch = Arc::new(fetch);
    for &status in &unique {
        let tx = tx.clone();
        let fetch = Arc::clone(&fetch);
        thread::Builder::new()
            .name(format!("fetch-{status}"))
            .spawn(move || {
                let result = fetch(status);
                // Receiver is gone once the deadline has passed; nothing to do then.
                let _ = tx.send(PartitionResult { status, result });
            })
            .with_context(|| format!("spawn fetch task for status {status}"))?;
    }
    // Queue closes when the last task drops its sender.
    drop(tx);

    let started = Instant::now();
    let mut outstanding: BTreeSet<Status> = unique.iter().copied().collect();

    while !outstanding.is_empty() {
        let next = match deadline {
            Some(limit) => match rx.recv_timeout(limit.saturating_sub(started.elapsed())) {
                Ok(r) => r,
                Err(RecvTimeoutError::Timeout) => {
                    report.timed_out = outstanding.iter().copied().collect();
                    tracing::warn!(
                        statuses = ?report.timed_out,
                        deadline_secs = limit.as_secs_f64(),
                        "cycle deadline passed; dropping outstanding partitions"
                    );
                    outstanding.clear();
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(r) => r,
                Err(_) => break,
            },
        };

        outstanding.remove(&next.status);
        match next.result {
            Ok(tickets) => {
                let n = tickets.len();
                reduce(next.status, tickets)
                    .with_context(|| format!("reduce partition {}", next.status))?;
                tracing::debug!(status = %next.status, tickets = n, "partition reduced");
                report.completed.push(next.status);
            }
            Err(e) => {
                tracing::warn!(status = %next.status, error = %format!("{e:#}"), "partition fetch failed; skipping for this cycle");
                report.failed.push(next.status);
            }
        }
    }

    // Tasks that ended without reporting (panicked).
    for status in outstanding {
        tracing::warn!(status = %status, "partition task ended without a result; skipping for this cycle");
        report.failed.push(status);
    }

    Ok(report)
}
