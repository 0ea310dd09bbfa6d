#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use ticketex::{SearchError, SearchPage, Status, Ticket, TicketSearch};
use tiny_http::{Header, Response, Server};

/// Build one ticket-typed search result. `channel == None` leaves out `via`.
pub fn ticket_json(
    id: u64,
    priority: &str,
    ticket_type: &str,
    channel: Option<&str>,
    tags: &[&str],
    custom_values: &[Value],
) -> Value {
    let fields: Vec<Value> = custom_values
        .iter()
        .enumerate()
        .map(|(i, v)| json!({ "id": 1000 + i as u64, "value": v }))
        .collect();
    let mut t = json!({
        "result_type": "ticket",
        "id": id,
        "priority": priority,
        "type": ticket_type,
        "tags": tags,
        "custom_fields": fields,
    });
    if let Some(c) = channel {
        t["via"] = json!({ "channel": c });
    }
    t
}

/// Same as `ticket_json`, decoded into the model type.
pub fn ticket(
    id: u64,
    priority: &str,
    ticket_type: &str,
    channel: Option<&str>,
    tags: &[&str],
    custom_values: &[Value],
) -> Ticket {
    serde_json::from_value(ticket_json(id, priority, ticket_type, channel, tags, custom_values)).unwrap()
}

/// A plain ticket with no tags, fields, priority or type.
pub fn bare_ticket(id: u64) -> Ticket {
    ticket(id, "", "", None, &[], &[])
}

pub fn user_json(id: u64) -> Value {
    json!({ "result_type": "user", "id": id, "name": "someone" })
}

pub fn page(results: Vec<Value>, has_next_page: bool) -> SearchPage {
    SearchPage { results, has_next_page }
}

pub fn status_of(query: &str) -> Option<Status> {
    query
        .split_whitespace()
        .find_map(|t| t.strip_prefix("status:"))
        .and_then(|s| s.parse().ok())
}

/// In-memory search service keyed by the `status:` term of the query.
#[derive(Default)]
pub struct FakeSearch {
    pages: HashMap<Status, Vec<SearchPage>>,
    failing: HashMap<Status, u16>,
    fail_on_page: HashMap<Status, u32>,
    delays: HashMap<Status, Duration>,
    panics: Vec<Status>,
    counts: HashMap<String, u64>,
    status_counts: HashMap<Status, u64>,
    rounds: HashMap<Status, Vec<Vec<Value>>>,
    served: Mutex<HashMap<Status, usize>>,
    pub calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// One page holding `tickets`, no further page.
    pub fn with_tickets(mut self, status: Status, tickets: Vec<Value>) -> Self {
        self.pages.insert(status, vec![page(tickets, false)]);
        self
    }

    pub fn with_pages(mut self, status: Status, pages: Vec<SearchPage>) -> Self {
        self.pages.insert(status, pages);
        self
    }

    pub fn failing(mut self, status: Status, http_status: u16) -> Self {
        self.failing.insert(status, http_status);
        self
    }

    pub fn failing_on_page(mut self, status: Status, page_no: u32) -> Self {
        self.fail_on_page.insert(status, page_no);
        self
    }

    pub fn delayed(mut self, status: Status, delay: Duration) -> Self {
        self.delays.insert(status, delay);
        self
    }

    pub fn panicking(mut self, status: Status) -> Self {
        self.panics.push(status);
        self
    }

    pub fn with_count(mut self, query: &str, n: u64) -> Self {
        self.counts.insert(query.to_string(), n);
        self
    }

    /// Count answered for any count query carrying `status:<status>`, whatever its date.
    pub fn with_status_count(mut self, status: Status, n: u64) -> Self {
        self.status_counts.insert(status, n);
        self
    }

    /// Single-page results that change per fetch of the partition: the n-th
    /// fetch gets `rounds[n]`, later fetches repeat the last entry.
    pub fn with_rounds(mut self, status: Status, rounds: Vec<Vec<Value>>) -> Self {
        self.rounds.insert(status, rounds);
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TicketSearch for FakeSearch {
    fn search(&self, query: &str, page_no: u32) -> Result<SearchPage, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), page_no));
        let status = status_of(query).expect("query carries a status term");

        if let Some(d) = self.delays.get(&status) {
            thread::sleep(*d);
        }
        if self.panics.contains(&status) {
            panic!("search backend blew up for {status}");
        }
        if let Some(code) = self.failing.get(&status) {
            return Err(SearchError::Status { status: *code, body: "boom".into() });
        }
        if self.fail_on_page.get(&status) == Some(&page_no) {
            return Err(SearchError::Status { status: 503, body: "unavailable".into() });
        }

        if let Some(rounds) = self.rounds.get(&status) {
            let mut served = self.served.lock().unwrap();
            let n = served.entry(status).or_insert(0);
            let results = rounds.get(*n).or_else(|| rounds.last()).cloned().unwrap_or_default();
            *n += 1;
            return Ok(page(results, false));
        }

        let pages = self.pages.get(&status).cloned().unwrap_or_default();
        Ok(pages.get(page_no.saturating_sub(1) as usize).cloned().unwrap_or_default())
    }

    fn count(&self, query: &str) -> Result<u64, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), 0));
        self.counts
            .get(query)
            .copied()
            .or_else(|| status_of(query).and_then(|s| self.status_counts.get(&s).copied()))
            .ok_or_else(|| SearchError::Status { status: 500, body: format!("no count for {query}") })
    }
}

/// What the mock API saw for one request.
#[derive(Clone, Debug)]
pub struct Captured {
    pub url: String,
    pub authorization: Option<String>,
}

/// Start a one-shot HTTP API that answers `responses` in order, then stops.
pub fn start_mock_api(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Captured>>>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_clone = captured.clone();
    let handle = thread::spawn(move || {
        let total = responses.len();
        let mut responses = VecDeque::from(responses);
        let mut incoming = server.incoming_requests();
        for _ in 0..total {
            let mut request = match incoming.next() {
                Some(req) => req,
                None => break,
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            captured_clone.lock().unwrap().push(Captured { url: request.url().to_string(), authorization });

            let (code, response_body) = responses.pop_front().unwrap_or((200, "{}".to_string()));
            let response = Response::from_string(response_body)
                .with_status_code(code)
                .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap());
            request.respond(response).expect("send response");
        }
    });
    (addr, captured, handle)
}
