//! HTTP listener: landing page at `/`, text exposition at the metrics path.

use crate::metrics::encode_text;
use anyhow::{anyhow, Result};
use prometheus::Registry;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Request, Response, Server};

pub struct MetricsServer {
    server: Server,
    metrics_path: String,
    registry: Arc<Registry>,
}

impl MetricsServer {
    pub fn bind(addr: &str, metrics_path: impl Into<String>, registry: Registry) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| anyhow!("listen on {addr}: {e}"))?;
        Ok(Self { server, metrics_path: metrics_path.into(), registry: Arc::new(registry) })
    }

    /// Bound address, e.g. `127.0.0.1:9633`.
    pub fn local_addr(&self) -> String {
        self.server.server_addr().to_string()
    }

    /// Serve until the listener shuts down. Each request is answered on its own thread.
    pub fn run(self) -> Result<()> {
        tracing::info!(addr = %self.local_addr(), path = %self.metrics_path, "serving metrics");
        for request in self.server.incoming_requests() {
            let registry = Arc::clone(&self.registry);
            let metrics_path = self.metrics_path.clone();
            thread::spawn(move || {
                let url = request.url().to_string();
                if let Err(e) = handle(request, &metrics_path, &registry) {
                    tracing::warn!(url = %url, error = %format!("{e:#}"), "failed to answer request");
                }
            });
        }
        Ok(())
    }
}

fn handle(request: Request, metrics_path: &str, registry: &Registry) -> Result<()> {
    let path = request.url().split('?').next().unwrap_or("").to_string();
    let response = route(&path, metrics_path, registry)?;
    request.respond(response)?;
    Ok(())
}

fn route(path: &str, metrics_path: &str, registry: &Registry) -> Result<Response<Cursor<Vec<u8>>>> {
    if path == metrics_path {
        let (body, content_type) = encode_text(registry)?;
        return Ok(Response::from_data(body).with_header(header("Content-Type", &content_type)?));
    }
    if path == "/" {
        return Ok(Response::from_string(landing_page(metrics_path))
            .with_header(header("Content-Type", "text/html; charset=utf-8")?));
    }
    Ok(Response::from_string("not found\n").with_status_code(404))
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).map_err(|_| anyhow!("invalid header {name}: {value}"))
}

pub fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html>\n<head><title>Zendesk Exporter</title></head>\n<body>\n<h1>Zendesk Exporter</h1>\n<p><a href=\"{metrics_path}\">Metrics</a></p>\n</body>\n</html>\n"
    )
}
