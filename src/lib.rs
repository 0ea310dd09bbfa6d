mod config;
mod date;
mod query;
mod ticket;
mod json_utils;

mod numeric;
mod search;
mod partition;
mod concurrency;
mod counting;
mod aggregate;
mod flatten;

mod pipeline;
mod metrics;
mod server;
mod util;

pub use crate::config::{normalize_listen_address, Credentials, ExporterOptions};
pub use crate::date::Day;
pub use crate::query::SearchQuery;
pub use crate::ticket::{CustomField, Status, Ticket, Via};

// Numeric classifier for custom-field values.
pub use crate::numeric::is_numeric;

// Search seam and the HTTP implementation.
pub use crate::search::{SearchError, SearchPage, TicketSearch, ZendeskClient};

// Core engine: fetch, fan-out, aggregate, flatten.
pub use crate::partition::PartitionFetcher;
pub use crate::concurrency::{fan_out, FanOutReport, PartitionResult};
pub use crate::counting::{CountMap, CounterTable, DimensionKey, LabelTally, NONE, UNKNOWN_CHANNEL};
pub use crate::aggregate::{tally_partition, AggregationSession, Aggregator, TicketDimensions};
pub use crate::flatten::{flatten, Family, MetricDesc, Observation};

// Per-cycle pipeline.
pub use crate::pipeline::{CycleSnapshot, TicketPipeline};

// Exposition and HTTP listener.
pub use crate::metrics::{
    encode_text, register_collectors, AllTimeCollector, GaugeFamilies, RecentStatusCollector, TicketsCollector,
    ALL_TIME_TOTAL, RECENT_STATUS,
};
pub use crate::server::{landing_page, MetricsServer};

pub use crate::json_utils::{field_value_labels, is_ticket_result};
pub use crate::util::init_tracing_once;
