use crate::ticket::Status;
use anyhow::{bail, Result};
use std::fmt;
use std::time::Duration;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExporterOptions {
    pub listen_address: String,         // host:port; a bare ":port" binds all interfaces
    pub metrics_path: String,           // always starts with '/'
    pub api_base_url: Option<String>,   // overrides https://{subdomain}.zendesk.com
    pub lookback_days: u32,             // created> window, in days
    pub page_size: u32,                 // search page size (service maximum is 100)
    pub request_timeout: Duration,      // per HTTP request
    pub cycle_deadline: Option<Duration>, // None waits for every partition
    pub statuses: Vec<Status>,          // partitions searched each cycle; never includes Closed

    // count-only collectors
    pub recent_status_counts: bool,     // counts for every status, Closed included
    pub all_time_total: bool,           // unfiltered ticket count
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9633".to_string(),
            metrics_path: "/metrics".to_string(),
            api_base_url: None,
            lookback_days: 30,
            page_size: 100,
            request_timeout: Duration::from_secs(30),
            cycle_deadline: Some(Duration::from_secs(120)),
            statuses: Status::ACTIVE.to_vec(),
            recent_status_counts: true,
            all_time_total: true,
        }
    }
}

impl ExporterOptions {
    pub fn with_listen_address(mut self, addr: impl AsRef<str>) -> Self {
        self.listen_address = normalize_listen_address(addr.as_ref());
        self
    }
    pub fn with_metrics_path(mut self, path: impl AsRef<str>) -> Self {
        let p = path.as_ref().trim();
        self.metrics_path = if p.starts_with('/') { p.to_string() } else { format!("/{p}") };
        self
    }
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days.max(1);
        self
    }
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.clamp(1, 100);
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
    pub fn with_cycle_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.cycle_deadline = deadline.filter(|d| !d.is_zero());
        self
    }
    /// Replace the searched partitions. `Closed` is dropped: it is count-only.
    pub fn with_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = Status>,
    {
        let mut v: Vec<Status> = statuses.into_iter().collect();
        if v.contains(&Status::Closed) {
            tracing::warn!("status \"closed\" cannot be searched per partition; ignoring it");
        }
        v.retain(|s| s.is_searchable());
        v.sort();
        v.dedup();
        self.statuses = v;
        self
    }
    pub fn with_recent_status_counts(mut self, yes: bool) -> Self {
        self.recent_status_counts = yes;
        self
    }
    pub fn with_all_time_total(mut self, yes: bool) -> Self {
        self.all_time_total = yes;
        self
    }
}

/// `:9633` -> `0.0.0.0:9633`; anything else is kept as given.
pub fn normalize_listen_address(addr: &str) -> String {
    let a = addr.trim();
    if a.starts_with(':') { format!("0.0.0.0{a}") } else { a.to_string() }
}

/// API credentials. Acquired once at startup; the core only sees the
/// authenticated client built from them.
#[derive(Clone)]
pub struct Credentials {
    pub subdomain: String,
    pub email: String,
    pub token: String,
}

impl Credentials {
    pub fn new(subdomain: impl Into<String>, email: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let creds = Self { subdomain: subdomain.into(), email: email.into(), token: token.into() };
        for (name, value) in [("ZENDESK_DOMAIN", &creds.subdomain), ("ZENDESK_EMAIL", &creds.email), ("ZENDESK_TOKEN", &creds.token)] {
            if value.trim().is_empty() {
                bail!("{name} must be set");
            }
        }
        Ok(creds)
    }

    /// Read `ZENDESK_DOMAIN`, `ZENDESK_EMAIL` and `ZENDESK_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let var = |k: &str| std::env::var(k).unwrap_or_default();
        Self::new(var("ZENDESK_DOMAIN"), var("ZENDESK_EMAIL"), var("ZENDESK_TOKEN"))
    }

    /// Accepts either a bare subdomain (`acme`) or a full host (`acme.zendesk.com`).
    pub fn base_url(&self) -> String {
        let d = self.subdomain.trim().trim_end_matches('/');
        let d = d.strip_prefix("https://").unwrap_or(d);
        if d.contains('.') { format!("https://{d}") } else { format!("https://{d}.zendesk.com") }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subdomain", &self.subdomain)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}
