//! Prometheus exposition: gauge families fed from the flattened table, and the
//! scrape-triggered collectors registered with the registry.

use crate::flatten::{Family, MetricDesc, Observation};
use crate::pipeline::{CycleSnapshot, TicketPipeline};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

pub const RECENT_STATUS: MetricDesc = MetricDesc {
    name: "zendesk_tickets_recent_status",
    help: "Number of tickets by status created in the lookback window",
    labels: &["status"],
};

pub const ALL_TIME_TOTAL: MetricDesc = MetricDesc {
    name: "zendesk_tickets_all_time_total",
    help: "Total number of tickets across all time",
    labels: &[],
};

/// One `GaugeVec` per flattened family.
pub struct GaugeFamilies {
    vecs: Vec<(Family, GaugeVec)>,
}

impl GaugeFamilies {
    pub fn new() -> Result<Self> {
        let mut vecs = Vec::with_capacity(Family::ALL.len());
        for family in Family::ALL {
            let d = family.desc();
            let vec = GaugeVec::new(Opts::new(d.name, d.help), d.labels)
                .with_context(|| format!("declare gauge family {}", d.name))?;
            vecs.push((family, vec));
        }
        Ok(Self { vecs })
    }

    fn vec(&self, family: Family) -> Option<&GaugeVec> {
        self.vecs.iter().find(|(f, _)| *f == family).map(|(_, v)| v)
    }

    /// Drop every series so a cycle never inherits values from the previous one.
    pub fn reset(&self) {
        for (_, v) in &self.vecs {
            v.reset();
        }
    }

    pub fn observe(&self, obs: &Observation) {
        let Some(vec) = self.vec(obs.family) else { return };
        let labels: Vec<&str> = obs.labels.iter().map(String::as_str).collect();
        match vec.get_metric_with_label_values(&labels) {
            Ok(gauge) => gauge.set(obs.value),
            Err(e) => tracing::warn!(family = obs.family.desc().name, error = %e, "dropping observation"),
        }
    }

    pub fn observe_all<'a, I>(&self, observations: I)
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        for obs in observations {
            self.observe(obs);
        }
    }

    fn descs(&self) -> Vec<&Desc> {
        self.vecs.iter().flat_map(|(_, v)| v.desc()).collect()
    }

    fn families(&self) -> Vec<MetricFamily> {
        self.vecs.iter().flat_map(|(_, v)| v.collect()).collect()
    }
}

/// Detailed ticket metrics. Every scrape runs one full collection cycle.
pub struct TicketsCollector {
    pipeline: TicketPipeline,
    families: GaugeFamilies,
    scrape: Mutex<()>,
}

impl TicketsCollector {
    pub fn new(pipeline: TicketPipeline) -> Result<Self> {
        Ok(Self { pipeline, families: GaugeFamilies::new()?, scrape: Mutex::new(()) })
    }

    /// Reset the families and refill them from a fresh cycle.
    fn refresh(&self) -> Option<CycleSnapshot> {
        self.families.reset();
        match self.pipeline.collect_cycle() {
            Ok(snapshot) => {
                self.families.observe_all(&snapshot.observations());
                Some(snapshot)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "error collecting ticket metrics");
                None
            }
        }
    }
}

impl Collector for TicketsCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.families.descs()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let _guard = self.scrape.lock();
        self.refresh();
        self.families.families()
    }
}

/// Per-status counts over the window via the count endpoint; covers `closed` too.
pub struct RecentStatusCollector {
    pipeline: TicketPipeline,
    status: GaugeVec,
    scrape: Mutex<()>,
}

impl RecentStatusCollector {
    pub fn new(pipeline: TicketPipeline) -> Result<Self> {
        let status = GaugeVec::new(Opts::new(RECENT_STATUS.name, RECENT_STATUS.help), RECENT_STATUS.labels)
            .context("declare recent status gauge")?;
        Ok(Self { pipeline, status, scrape: Mutex::new(()) })
    }
}

impl Collector for RecentStatusCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.status.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let _guard = self.scrape.lock();
        self.status.reset();
        for (status, count) in self.pipeline.recent_status_counts() {
            self.status.with_label_values(&[status.as_str()]).set(count as f64);
        }
        self.status.collect()
    }
}

/// Unfiltered all-time ticket count. A failed count emits no sample.
pub struct AllTimeCollector {
    pipeline: TicketPipeline,
    total: Gauge,
}

impl AllTimeCollector {
    pub fn new(pipeline: TicketPipeline) -> Result<Self> {
        let total = Gauge::with_opts(Opts::new(ALL_TIME_TOTAL.name, ALL_TIME_TOTAL.help))
            .context("declare all-time gauge")?;
        Ok(Self { pipeline, total })
    }
}

impl Collector for AllTimeCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.total.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self.pipeline.all_time_count() {
            Ok(n) => {
                self.total.set(n as f64);
                self.total.collect()
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "error getting all-time ticket count");
                Vec::new()
            }
        }
    }
}

/// Register the detailed collector plus whichever count collectors are enabled.
pub fn register_collectors(registry: &Registry, pipeline: &TicketPipeline) -> Result<()> {
    registry
        .register(Box::new(TicketsCollector::new(pipeline.clone())?))
        .context("register ticket collector")?;
    if pipeline.options().recent_status_counts {
        registry
            .register(Box::new(RecentStatusCollector::new(pipeline.clone())?))
            .context("register recent status collector")?;
    }
    if pipeline.options().all_time_total {
        registry
            .register(Box::new(AllTimeCollector::new(pipeline.clone())?))
            .context("register all-time collector")?;
    }
    Ok(())
}

/// Render everything in `registry` in the text exposition format.
/// Returns the body and its content type.
pub fn encode_text(registry: &Registry) -> Result<(Vec<u8>, String)> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer).context("encode metrics")?;
    Ok((buffer, encoder.format_type().to_string()))
}
