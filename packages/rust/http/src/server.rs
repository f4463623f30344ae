//! `tiny_http` listener feeding the [`Router`].
//!
//! `tiny_http::Server::recv` blocks, so the accept loop runs in
//! `spawn_blocking` and only hands requests off. Each request is then its
//! own tokio task; a slow client never holds up the accept loop.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use draftdeck_gateway::TextGenerator;
use draftdeck_shared::{DraftDeckError, Result};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::message::{ApiRequest, ApiResponse, Method};
use crate::router::Router;

/// Largest request body accepted.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

pub struct HttpServer {
    server: Arc<tiny_http::Server>,
}

/// Stops a running [`HttpServer`] from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<tiny_http::Server>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.server.unblock();
    }
}

impl HttpServer {
    /// Bind to `addr`, e.g. `127.0.0.1:8787` (port 0 picks a free port).
    pub fn bind(addr: &str) -> Result<Self> {
        let server = tiny_http::Server::http(addr)
            .map_err(|e| DraftDeckError::Network(format!("failed to bind {addr}: {e}")))?;
        Ok(Self {
            server: Arc::new(server),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
        }
    }

    /// Serve until [`ShutdownHandle::shutdown`] is called.
    pub async fn run<G>(self, router: Router<G>) -> Result<()>
    where
        G: TextGenerator + 'static,
    {
        if let Some(addr) = self.local_addr() {
            info!(%addr, "listening");
        }
        let router = Arc::new(router);
        let runtime = Handle::current();
        let server = self.server;

        tokio::task::spawn_blocking(move || accept_loop(&server, &router, &runtime))
            .await
            .map_err(|e| DraftDeckError::Network(format!("accept loop panicked: {e}")))?;

        info!("server stopped");
        Ok(())
    }
}

fn accept_loop<G>(server: &tiny_http::Server, router: &Arc<Router<G>>, runtime: &Handle)
where
    G: TextGenerator + 'static,
{
    // Ends once the server is unblocked.
    for request in server.incoming_requests() {
        runtime.spawn(serve_request(Arc::clone(router), request));
    }
}

/// Read, route and answer one request. Body reads and response writes block
/// on the socket, so both run on the blocking pool.
async fn serve_request<G>(router: Arc<Router<G>>, mut request: tiny_http::Request)
where
    G: TextGenerator + 'static,
{
    let read = tokio::task::spawn_blocking(move || {
        let api_request = read_request(&mut request);
        (request, api_request)
    })
    .await;
    let (request, api_request) = match read {
        Ok(read) => read,
        Err(e) => {
            warn!(error = %e, "request reader panicked");
            return;
        }
    };

    let response = match api_request {
        Ok(api_request) => router.handle(api_request).await,
        Err(e) => {
            warn!(error = %e, "rejecting unreadable request");
            router.with_cors(ApiResponse::from_error(&e))
        }
    };

    let written = tokio::task::spawn_blocking(move || respond(request, response)).await;
    if let Err(e) = written {
        warn!(error = %e, "response writer panicked");
    }
}

fn read_request(request: &mut tiny_http::Request) -> Result<ApiRequest> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|e| DraftDeckError::validation(format!("failed to read request body: {e}")))?;
    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(DraftDeckError::validation("request body too large"));
    }

    Ok(ApiRequest {
        method: Method::parse(&request.method().to_string()),
        path: request.url().to_string(),
        headers: request
            .headers()
            .iter()
            .map(|h| (h.field.to_string(), h.value.to_string()))
            .collect(),
        body,
    })
}

fn respond(request: tiny_http::Request, response: ApiResponse) {
    let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);
    for (name, value) in &response.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "dropping invalid response header"),
        }
    }
    if let Err(e) = request.respond(out) {
        warn!(error = %e, "failed to write response");
    }
}
