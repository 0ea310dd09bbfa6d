use anyhow::Result;
use clap::Parser;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use ticketex::{
    init_tracing_once, register_collectors, Credentials, ExporterOptions, MetricsServer, Status, TicketPipeline,
    ZendeskClient,
};

/// Prometheus exporter for helpdesk ticket counts.
#[derive(Parser, Debug)]
#[command(name = "ticketex")]
#[command(version)]
struct Cli {
    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address", default_value = ":9633")]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    metrics_path: String,

    /// Helpdesk subdomain (or full host).
    #[arg(long = "zendesk.domain", env = "ZENDESK_DOMAIN")]
    domain: Option<String>,

    /// Agent email used for API-token authentication.
    #[arg(long = "zendesk.email", env = "ZENDESK_EMAIL")]
    email: Option<String>,

    /// API token.
    #[arg(long = "zendesk.token", env = "ZENDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the API base URL (defaults to https://<domain>.zendesk.com).
    #[arg(long = "zendesk.api-url")]
    api_url: Option<String>,

    /// Only count tickets created within this many days.
    #[arg(long = "zendesk.lookback-days", default_value_t = 30)]
    lookback_days: u32,

    /// Search page size (1..=100).
    #[arg(long = "zendesk.page-size", default_value_t = 100)]
    page_size: u32,

    /// Per-request timeout, in seconds.
    #[arg(long = "zendesk.request-timeout", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Per-cycle deadline, in seconds. 0 waits for every partition.
    #[arg(long = "collector.cycle-deadline", default_value_t = 120)]
    cycle_deadline_secs: u64,

    /// Statuses searched per partition ("closed" is count-only).
    #[arg(long = "collector.statuses", value_delimiter = ',', default_value = "new,open,pending,solved")]
    statuses: Vec<Status>,

    /// Disable the per-status count collector.
    #[arg(long = "no-collector.recent-status")]
    no_recent_status: bool,

    /// Disable the all-time total collector.
    #[arg(long = "no-collector.all-time")]
    no_all_time: bool,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long = "log.level", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_once(&cli.log_level);

    let creds = Credentials::new(
        cli.domain.unwrap_or_default(),
        cli.email.unwrap_or_default(),
        cli.token.unwrap_or_default(),
    )?;

    let mut opts = ExporterOptions::default()
        .with_listen_address(&cli.listen_address)
        .with_metrics_path(&cli.metrics_path)
        .with_lookback_days(cli.lookback_days)
        .with_page_size(cli.page_size)
        .with_request_timeout(Duration::from_secs(cli.request_timeout_secs))
        .with_cycle_deadline(Some(Duration::from_secs(cli.cycle_deadline_secs)))
        .with_statuses(cli.statuses)
        .with_recent_status_counts(!cli.no_recent_status)
        .with_all_time_total(!cli.no_all_time);
    if let Some(url) = cli.api_url {
        opts = opts.with_api_base_url(url);
    }

    let client = ZendeskClient::new(&creds, &opts)?;
    tracing::info!(
        api = client.base_url(),
        statuses = ?opts.statuses,
        lookback_days = opts.lookback_days,
        "starting Zendesk exporter"
    );

    let pipeline = TicketPipeline::new(Arc::new(client), opts.clone());
    let registry = Registry::new();
    register_collectors(&registry, &pipeline)?;

    MetricsServer::bind(&opts.listen_address, opts.metrics_path.clone(), registry)?.run()
}
