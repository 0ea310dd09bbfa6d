use anyhow::{Context, Result};
use std::sync::Arc;

use crate::date::Day;
use crate::json_utils::is_ticket_result;
use crate::query::SearchQuery;
use crate::search::TicketSearch;
use crate::ticket::{Status, Ticket};

/// Fetches one status partition to completion, a page at a time.
///
/// Query shape: `created><day> status:<status> type:ticket`.
///
/// Notes:
///  - Pages are requested until the service reports no further page, even
///    when a page comes back empty.
///  - Non-ticket items are dropped; page order and in-page order are kept.
///  - The first failing page aborts the partition with that page's error.
#[derive(Clone)]
pub struct PartitionFetcher {
    search: Arc<dyn TicketSearch>,
    created_after: Day,
}

impl PartitionFetcher {
    pub fn new(search: Arc<dyn TicketSearch>, created_after: Day) -> Self {
        Self { search, created_after }
    }

    pub fn created_after(&self) -> Day {
        self.created_after
    }

    pub fn query_for(&self, status: Status) -> String {
        SearchQuery::tickets().created_after(self.created_after).status(status).render()
    }

    pub fn fetch(&self, status: Status) -> Result<Vec<Ticket>> {
        let query = self.query_for(status);
        let mut tickets = Vec::new();
        let mut page_no: u32 = 1;

        loop {
            let page = self
                .search
                .search(&query, page_no)
                .with_context(|| format!("search page {page_no} for status {status}"))?;

            let before = tickets.len();
            for item in page.results {
                if !is_ticket_result(&item) {
                    continue;
                }
                let ticket: Ticket = serde_json::from_value(item)
                    .with_context(|| format!("decode ticket on page {page_no} for status {status}"))?;
                tickets.push(ticket);
            }
            tracing::debug!(status = %status, page = page_no, tickets = tickets.len() - before, "fetched search page");

            if !page.has_next_page {
                break;
            }
            page_no = page_no.saturating_add(1);
        }

        Ok(tickets)
    }
}
