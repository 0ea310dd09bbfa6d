//! Flattening of a finished counter table into gauge observations.

use crate::counting::{CounterTable, LabelTally};

/// Static description of one gauge family: name, help and declared label order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Tickets,
    StatusTotal,
    Tags,
    TaggedTotal,
    CustomFields,
    CustomFieldTotal,
}

impl Family {
    pub const ALL: [Family; 6] = [
        Family::Tickets,
        Family::StatusTotal,
        Family::Tags,
        Family::TaggedTotal,
        Family::CustomFields,
        Family::CustomFieldTotal,
    ];

    pub fn desc(self) -> MetricDesc {
        match self {
            Family::Tickets => MetricDesc {
                name: "zendesk_tickets_count",
                help: "Number of tickets by status, priority, channel, type, tag, and custom field created in the lookback window",
                labels: &["status", "priority", "channel", "type", "tag", "custom_field"],
            },
            Family::StatusTotal => MetricDesc {
                name: "zendesk_tickets_total",
                help: "Total number of tickets by status created in the lookback window",
                labels: &["status"],
            },
            Family::Tags => MetricDesc {
                name: "zendesk_tickets_tags_count",
                help: "Number of tickets by tag and status created in the lookback window",
                labels: &["tag", "status"],
            },
            Family::TaggedTotal => MetricDesc {
                name: "zendesk_tickets_tags_total",
                help: "Total number of tickets with tags in the lookback window",
                labels: &["status"],
            },
            Family::CustomFields => MetricDesc {
                name: "zendesk_tickets_custom_fields_count",
                help: "Number of tickets by custom field value (excluding numeric values) and status created in the lookback window",
                labels: &["field_value", "status"],
            },
            Family::CustomFieldTotal => MetricDesc {
                name: "zendesk_tickets_custom_fields_total",
                help: "Total number of tickets with non-numeric custom fields in the lookback window",
                labels: &["status"],
            },
        }
    }
}

/// One gauge sample. `labels` follow `family.desc().labels` order exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub family: Family,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    fn new<'a>(family: Family, labels: impl IntoIterator<Item = &'a str>, value: u64) -> Self {
        Self { family, labels: labels.into_iter().map(str::to_string).collect(), value: value as f64 }
    }
}

/// Walk the table once. Detailed keys with a zero count are skipped; every
/// status present in a total is emitted, zero included.
pub fn flatten(table: &CounterTable) -> Vec<Observation> {
    let mut out = Vec::with_capacity(table.detailed.len() + table.totals.len());

    for (status, total) in &table.totals {
        out.push(Observation::new(Family::StatusTotal, [status.as_str()], *total));
    }
    for (key, count) in &table.detailed {
        if *count > 0 {
            out.push(Observation::new(Family::Tickets, key.label_values(), *count));
        }
    }
    flatten_tally(&table.tags, Family::Tags, Family::TaggedTotal, &mut out);
    flatten_tally(&table.custom_fields, Family::CustomFields, Family::CustomFieldTotal, &mut out);

    out
}

fn flatten_tally(tally: &LabelTally, counts: Family, totals: Family, out: &mut Vec<Observation>) {
    for ((status, value), count) in &tally.counts {
        if *count > 0 {
            out.push(Observation::new(counts, [value.as_str(), status.as_str()], *count));
        }
    }
    for (status, total) in &tally.totals {
        out.push(Observation::new(totals, [status.as_str()], *total));
    }
}
