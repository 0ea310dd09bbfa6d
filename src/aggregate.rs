//! Multi-dimensional aggregation of ticket partitions.
//! `Aggregator` is the per-ticket fold; `AggregationSession` owns the shared
//! table for exactly one collection cycle.

use crate::counting::{CounterTable, DimensionKey, NONE, UNKNOWN_CHANNEL};
use crate::json_utils::field_value_labels;
use crate::numeric::is_numeric;
use crate::ticket::{Status, Ticket};
use ahash::AHashSet;
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::collections::BTreeSet;

pub trait Aggregator: Send + Default {
    fn ingest(&mut self, status: Status, ticket: &Ticket);
    fn merge(&mut self, other: Self);
}

/// Dimension values derived from one ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketDimensions {
    pub priority: String,
    pub channel: String,
    pub ticket_type: String,
    /// Real tags, deduplicated. Empty when the ticket has none.
    pub tags: BTreeSet<String>,
    /// Non-empty, non-numeric custom-field values, deduplicated.
    pub custom_fields: BTreeSet<String>,
}

impl TicketDimensions {
    pub fn of(ticket: &Ticket) -> Self {
        let tags = ticket
            .tags
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();

        let custom_fields = ticket
            .custom_fields
            .iter()
            .flat_map(|f| field_value_labels(&f.value))
            .filter(|v| !v.is_empty() && !is_numeric(v))
            .collect();

        Self {
            priority: ticket.priority().unwrap_or(NONE).to_string(),
            channel: ticket.channel().unwrap_or(UNKNOWN_CHANNEL).to_string(),
            ticket_type: ticket.ticket_type().unwrap_or(NONE).to_string(),
            tags,
            custom_fields,
        }
    }

    /// Tag values the detailed table attributes this ticket to: the real tags,
    /// or exactly `{"none"}`.
    pub fn tags_used(&self) -> Vec<&str> {
        used_or_none(&self.tags)
    }

    pub fn custom_fields_used(&self) -> Vec<&str> {
        used_or_none(&self.custom_fields)
    }
}

fn used_or_none(values: &BTreeSet<String>) -> Vec<&str> {
    if values.is_empty() {
        vec![NONE]
    } else {
        values.iter().map(String::as_str).collect()
    }
}

impl Aggregator for CounterTable {
    /// One ticket adds `|tags| x |fields|` detailed increments and exactly one
    /// to the status total.
    fn ingest(&mut self, status: Status, ticket: &Ticket) {
        let dims = TicketDimensions::of(ticket);

        for tag in dims.tags_used() {
            for field in dims.custom_fields_used() {
                self.increment(DimensionKey {
                    status,
                    priority: dims.priority.clone(),
                    channel: dims.channel.clone(),
                    ticket_type: dims.ticket_type.clone(),
                    tag: tag.to_string(),
                    custom_field: field.to_string(),
                });
            }
        }
        *self.totals.entry(status).or_insert(0) += 1;

        self.tags.record(status, dims.tags.iter().map(String::as_str));
        self.custom_fields.record(status, dims.custom_fields.iter().map(String::as_str));
    }

    fn merge(&mut self, other: Self) {
        self.merge_table(other);
    }
}

/// Tally one partition on its own, independent of every other partition.
pub fn tally_partition<A: Aggregator>(status: Status, tickets: &[Ticket]) -> A {
    let mut local = A::default();
    for ticket in tickets {
        local.ingest(status, ticket);
    }
    local
}

/// Per-cycle aggregation state. Built fresh for every cycle and consumed by
/// `into_table`; nothing survives between cycles.
///
/// `reduce` may be called from any thread; merges are serialized by the table lock.
#[derive(Default)]
pub struct AggregationSession {
    table: Mutex<CounterTable>,
    reduced: Mutex<AHashSet<Status>>,
}

impl AggregationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one partition into the shared table. Reducing the same status twice
    /// in one session is a caller bug and is rejected without touching the table.
    pub fn reduce(&self, status: Status, tickets: &[Ticket]) -> Result<()> {
        if !self.reduced.lock().insert(status) {
            bail!("partition {status} was already reduced in this cycle");
        }

        let mut local: CounterTable = tally_partition(status, tickets);
        local.touch(status);

        self.table.lock().merge(local);
        Ok(())
    }

    pub fn reduced_statuses(&self) -> Vec<Status> {
        let mut v: Vec<Status> = self.reduced.lock().iter().copied().collect();
        v.sort();
        v
    }

    pub fn into_table(self) -> CounterTable {
        self.table.into_inner()
    }
}
