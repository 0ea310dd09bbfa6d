//! Counter table for one collection cycle: a flat map keyed by the full
//! dimension tuple, per-status totals, and the tag / custom-field side tallies.
//! Every merge is additive, so the order partitions arrive in does not matter.

use crate::ticket::Status;
use ahash::RandomState;
use std::collections::HashMap;

pub type CountMap<K> = HashMap<K, u64, RandomState>;

/// Synthetic dimension value for a ticket with no real value.
pub const NONE: &str = "none";
/// Channel value when a ticket carries no `via.channel`.
pub const UNKNOWN_CHANNEL: &str = "unknown";

/// Composite key of the detailed table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionKey {
    pub status: Status,
    pub priority: String,
    pub channel: String,
    pub ticket_type: String,
    pub tag: String,
    pub custom_field: String,
}

impl DimensionKey {
    /// Label values in the order declared for `zendesk_tickets_count`.
    pub fn label_values(&self) -> [&str; 6] {
        [
            self.status.as_str(),
            &self.priority,
            &self.channel,
            &self.ticket_type,
            &self.tag,
            &self.custom_field,
        ]
    }
}

/// Single-dimension tally per status: how many tickets carry each value, and
/// how many tickets carry at least one value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTally {
    pub counts: CountMap<(Status, String)>,
    pub totals: CountMap<Status>,
}

impl LabelTally {
    pub fn record<'a, I>(&mut self, status: Status, values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any = false;
        for v in values {
            *self.counts.entry((status, v.to_string())).or_insert(0) += 1;
            any = true;
        }
        if any {
            *self.totals.entry(status).or_insert(0) += 1;
        }
    }

    pub fn touch(&mut self, status: Status) {
        self.totals.entry(status).or_insert(0);
    }

    pub fn merge(&mut self, other: LabelTally) {
        merge_counts(&mut self.counts, other.counts);
        merge_counts(&mut self.totals, other.totals);
    }

    pub fn count(&self, status: Status, value: &str) -> u64 {
        self.counts.get(&(status, value.to_string())).copied().unwrap_or(0)
    }

    pub fn total(&self, status: Status) -> Option<u64> {
        self.totals.get(&status).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterTable {
    pub detailed: CountMap<DimensionKey>,
    pub totals: CountMap<Status>,
    pub tags: LabelTally,
    pub custom_fields: LabelTally,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn increment(&mut self, key: DimensionKey) {
        *self.detailed.entry(key).or_insert(0) += 1;
    }

    /// Make `status` present in every per-status total, even at zero.
    pub fn touch(&mut self, status: Status) {
        self.totals.entry(status).or_insert(0);
        self.tags.touch(status);
        self.custom_fields.touch(status);
    }

    pub fn merge_table(&mut self, other: CounterTable) {
        merge_counts(&mut self.detailed, other.detailed);
        merge_counts(&mut self.totals, other.totals);
        self.tags.merge(other.tags);
        self.custom_fields.merge(other.custom_fields);
    }

    pub fn count(&self, key: &DimensionKey) -> u64 {
        self.detailed.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self, status: Status) -> Option<u64> {
        self.totals.get(&status).copied()
    }

    pub fn statuses(&self) -> Vec<Status> {
        let mut v: Vec<Status> = self.totals.keys().copied().collect();
        v.sort();
        v
    }

    pub fn ticket_count(&self) -> u64 {
        self.totals.values().sum()
    }
}

pub fn merge_counts<K: std::hash::Hash + Eq>(total: &mut CountMap<K>, part: CountMap<K>) {
    for (k, v) in part {
        *total.entry(k).or_insert(0) += v;
    }
}
