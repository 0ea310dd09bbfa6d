//! Search service seam: the `TicketSearch` trait the core consumes, and the
//! blocking HTTP client that implements it against the helpdesk search API.

use crate::config::{Credentials, ExporterOptions};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const SEARCH_PATH: &str = "/api/v2/search.json";
const COUNT_PATH: &str = "/api/v2/search/count.json";
const MAX_ERROR_BODY: usize = 512;

/// One page of search results. Items are heterogeneous (tickets, users,
/// organizations, ...); callers filter on `result_type`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    pub results: Vec<Value>,
    pub has_next_page: bool,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SearchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Transport(e) if e.is_timeout())
    }
}

/// Authenticated search capability. Pages are 1-based.
pub trait TicketSearch: Send + Sync {
    fn search(&self, query: &str, page: u32) -> Result<SearchPage, SearchError>;
    fn count(&self, query: &str) -> Result<u64, SearchError>;
}

#[derive(Deserialize)]
struct RawSearchPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Deserialize)]
struct RawCount {
    count: u64,
}

/// Blocking client for the helpdesk REST API using API-token basic auth.
#[derive(Debug, Clone)]
pub struct ZendeskClient {
    http: Client,
    base_url: String,
    user: String,
    token: String,
    page_size: u32,
}

impl ZendeskClient {
    pub fn new(creds: &Credentials, opts: &ExporterOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(opts.request_timeout)
            .user_agent(concat!("ticketex/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        let base_url = opts.api_base_url.clone().unwrap_or_else(|| creds.base_url());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            user: format!("{}/token", creds.email),
            token: creds.token.clone(),
            page_size: opts.page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> Result<String, SearchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.token))
            .query(params)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        Ok(body)
    }
}

impl TicketSearch for ZendeskClient {
    fn search(&self, query: &str, page: u32) -> Result<SearchPage, SearchError> {
        let body = self.get(
            SEARCH_PATH,
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("per_page", self.page_size.to_string()),
            ],
        )?;
        let raw: RawSearchPage = serde_json::from_str(&body)?;
        Ok(SearchPage {
            results: raw.results,
            has_next_page: raw.next_page.is_some_and(|next| !next.is_empty()),
        })
    }

    fn count(&self, query: &str) -> Result<u64, SearchError> {
        let body = self.get(COUNT_PATH, &[("query", query.to_string())])?;
        let raw: RawCount = serde_json::from_str(&body)?;
        Ok(raw.count)
    }
}
