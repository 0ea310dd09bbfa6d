use crate::aggregate::AggregationSession;
use crate::concurrency::{fan_out, FanOutReport};
use crate::config::ExporterOptions;
use crate::counting::CounterTable;
use crate::date::Day;
use crate::flatten::{flatten, Observation};
use crate::partition::PartitionFetcher;
use crate::query::SearchQuery;
use crate::search::TicketSearch;
use crate::ticket::Status;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything one collection cycle produced.
#[derive(Clone, Debug)]
pub struct CycleSnapshot {
    pub created_after: Day,
    pub table: CounterTable,
    pub report: FanOutReport,
    pub elapsed: Duration,
}

impl CycleSnapshot {
    pub fn observations(&self) -> Vec<Observation> {
        flatten(&self.table)
    }
}

/// Fan-out / fetch / reduce over the configured status partitions.
#[derive(Clone)]
pub struct TicketPipeline {
    search: Arc<dyn TicketSearch>,
    opts: ExporterOptions,
}

impl TicketPipeline {
    pub fn new(search: Arc<dyn TicketSearch>, opts: ExporterOptions) -> Self {
        Self { search, opts }
    }

    pub fn options(&self) -> &ExporterOptions {
        &self.opts
    }

    pub fn search(&self) -> &Arc<dyn TicketSearch> {
        &self.search
    }

    /// Lower bound of the current window, `lookback_days` before today (UTC).
    pub fn window_start(&self) -> Day {
        Day::lookback(self.opts.lookback_days)
    }

    pub fn collect_cycle(&self) -> Result<CycleSnapshot> {
        self.collect_cycle_since(self.window_start())
    }

    /// Run one cycle with an explicit window start. A fresh session is built
    /// here and dropped once its table has been handed back.
    pub fn collect_cycle_since(&self, created_after: Day) -> Result<CycleSnapshot> {
        let started = Instant::now();
        let fetcher = PartitionFetcher::new(Arc::clone(&self.search), created_after);
        let session = AggregationSession::new();

        let report = fan_out(
            &self.opts.statuses,
            self.opts.cycle_deadline,
            move |status| fetcher.fetch(status),
            |status, tickets| session.reduce(status, &tickets),
        )
        .with_context(|| format!("collection cycle for tickets created after {created_after}"))?;

        let table = session.into_table();
        let elapsed = started.elapsed();
        tracing::info!(
            tickets = table.ticket_count(),
            series = table.detailed.len(),
            completed = ?report.completed,
            failed = ?report.failed,
            timed_out = ?report.timed_out,
            elapsed_ms = elapsed.as_millis() as u64,
            "collection cycle finished"
        );

        Ok(CycleSnapshot { created_after, table, report, elapsed })
    }

    /// Count tickets per status over the current window, `Closed` included.
    /// Statuses whose count fails are left out.
    pub fn recent_status_counts(&self) -> Vec<(Status, u64)> {
        let created_after = self.window_start();
        let mut out = Vec::with_capacity(Status::ALL.len());
        for status in Status::ALL {
            let query = SearchQuery::tickets().created_after(created_after).status(status).render();
            match self.search.count(&query) {
                Ok(n) => out.push((status, n)),
                Err(e) => tracing::warn!(status = %status, error = %e, "recent ticket count failed; skipping status"),
            }
        }
        out
    }

    /// Unfiltered ticket count across all time.
    pub fn all_time_count(&self) -> Result<u64> {
        let query = SearchQuery::tickets().render();
        self.search.count(&query).context("all-time ticket count")
    }
}
