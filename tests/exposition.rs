#[path = "common/mod.rs"]
mod common;

use common::*;
use prometheus::core::Collector;
use prometheus::Registry;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use ticketex::{
    encode_text, landing_page, register_collectors, AllTimeCollector, ExporterOptions, MetricsServer,
    Status, TicketPipeline, TicketsCollector,
};

fn sample_search() -> FakeSearch {
    FakeSearch::new()
        .with_tickets(
            Status::Open,
            vec![
                ticket_json(1, "", "", None, &[], &[]),
                ticket_json(2, "urgent", "", None, &["vip"], &[json!("gold")]),
            ],
        )
        .failing(Status::Pending, 500)
}

fn exposition(registry: &Registry) -> String {
    let (body, content_type) = encode_text(registry).unwrap();
    assert!(content_type.starts_with("text/plain"), "content type: {content_type}");
    String::from_utf8(body).unwrap()
}

/// One scrape runs a cycle and exposes every family that has samples; the
/// failed partition contributes nothing.
#[test]
fn scrape_exposes_cycle_results() {
    let pipeline = TicketPipeline::new(
        Arc::new(sample_search()),
        ExporterOptions::default().with_recent_status_counts(false).with_all_time_total(false),
    );
    let registry = Registry::new();
    register_collectors(&registry, &pipeline).unwrap();

    let text = exposition(&registry);
    assert!(text.contains("# TYPE zendesk_tickets_count gauge"), "{text}");
    assert!(text.contains("zendesk_tickets_total{status=\"open\"} 2"), "{text}");
    assert!(text.contains("zendesk_tickets_total{status=\"new\"} 0"), "{text}");
    assert!(text.contains("zendesk_tickets_tags_total{status=\"open\"} 1"), "{text}");
    assert!(text.contains("zendesk_tickets_custom_fields_total{status=\"open\"} 1"), "{text}");
    assert!(text.contains("tag=\"vip\""), "{text}");
    assert!(!text.contains("status=\"pending\""), "{text}");
    assert!(!text.contains("zendesk_tickets_recent_status"), "{text}");
    assert!(!text.contains("zendesk_tickets_all_time_total"), "{text}");
}

/// Values reflect only the latest cycle: the second scrape sees different
/// tickets, and the series from the first scrape are gone.
#[test]
fn collector_resets_between_scrapes() {
    let search = FakeSearch::new().with_rounds(
        Status::Open,
        vec![
            vec![ticket_json(1, "", "", None, &["first"], &[json!("early")])],
            vec![ticket_json(2, "", "", None, &["second"], &[])],
        ],
    );
    let collector = TicketsCollector::new(TicketPipeline::new(
        Arc::new(search),
        ExporterOptions::default().with_statuses(vec![Status::Open]),
    ))
    .unwrap();

    let labels = |families: Vec<prometheus::proto::MetricFamily>| -> Vec<String> {
        families
            .iter()
            .flat_map(|mf| mf.get_metric().iter())
            .flat_map(|m| m.get_label().iter())
            .map(|l| l.get_value().to_string())
            .collect()
    };

    let first = labels(collector.collect());
    assert!(first.iter().any(|v| v == "first"));
    assert!(first.iter().any(|v| v == "early"));

    let second = labels(collector.collect());
    assert!(second.iter().any(|v| v == "second"));
    assert!(!second.iter().any(|v| v == "first"), "stale tag series: {second:?}");
    assert!(!second.iter().any(|v| v == "early"), "stale custom field series: {second:?}");
}

/// A failing all-time count emits no sample rather than a zero.
#[test]
fn all_time_failure_emits_nothing() {
    let pipeline = TicketPipeline::new(Arc::new(FakeSearch::new()), ExporterOptions::default());
    let collector = AllTimeCollector::new(pipeline).unwrap();
    assert!(collector.collect().is_empty());
}

/// Count collectors answer from the count endpoint over the pipeline's window.
#[test]
fn all_time_and_recent_counts() {
    let search = Arc::new(
        FakeSearch::new()
            .with_count("type:ticket", 1234)
            .with_status_count(Status::Open, 7)
            .with_status_count(Status::Closed, 3),
    );
    let pipeline = TicketPipeline::new(search.clone(), ExporterOptions::default().with_statuses(vec![]));
    let registry = Registry::new();
    register_collectors(&registry, &pipeline).unwrap();

    let text = exposition(&registry);
    assert!(text.contains("zendesk_tickets_all_time_total 1234"), "{text}");
    assert!(text.contains("zendesk_tickets_recent_status{status=\"open\"} 7"), "{text}");
    assert!(text.contains("zendesk_tickets_recent_status{status=\"closed\"} 3"), "{text}");
    // Statuses whose count failed are skipped.
    assert!(!text.contains("zendesk_tickets_recent_status{status=\"new\"}"), "{text}");

    let recent: Vec<String> = search
        .calls()
        .into_iter()
        .map(|(q, _)| q)
        .filter(|q| q.contains("status:"))
        .collect();
    assert_eq!(recent.len(), Status::ALL.len());
    assert!(recent.iter().all(|q| q.starts_with("created>") && q.ends_with(" type:ticket")));
}

/// Landing page, metrics path and 404 over a real listener.
#[test]
fn server_routes() {
    let pipeline = TicketPipeline::new(
        Arc::new(sample_search()),
        ExporterOptions::default().with_recent_status_counts(false).with_all_time_total(false),
    );
    let registry = Registry::new();
    register_collectors(&registry, &pipeline).unwrap();

    let server = MetricsServer::bind("127.0.0.1:0", "/metrics", registry).unwrap();
    let base = format!("http://{}", server.local_addr());
    thread::spawn(move || server.run());

    let http = reqwest::blocking::Client::new();

    let root = http.get(format!("{base}/")).send().unwrap();
    assert_eq!(root.status().as_u16(), 200);
    assert_eq!(root.text().unwrap(), landing_page("/metrics"));

    let metrics = http.get(format!("{base}/metrics")).send().unwrap();
    assert_eq!(metrics.status().as_u16(), 200);
    assert!(metrics.text().unwrap().contains("zendesk_tickets_total{status=\"open\"} 2"));

    let missing = http.get(format!("{base}/nope")).send().unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}
