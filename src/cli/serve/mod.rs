//! HTTP server for the editor and the published site.

mod handler;
mod lifecycle;
mod path;
mod response;
mod route;

use handler::{App, IncomingRequest};

use crate::{
    config::{SiteConfig, cfg},
    core, debug, log,
    page::PageStore,
    publish::Mailer,
};
use anyhow::{Context, Result};
use response::Reply;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Serve with the global config until Ctrl+C.
pub fn serve(store: Arc<dyn PageStore>, mailer: Option<Arc<dyn Mailer>>) -> Result<()> {
    let config = cfg();
    let bound = bind_server(&config)?;
    bound.run(App::new(config, store, mailer))
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    workers: usize,
    max_body: usize,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(config: &SiteConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    core::register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        workers: config.serve.workers,
        max_body: config.serve.max_body,
    })
}

impl BoundServer {
    /// Run the request loop until shutdown (blocking).
    pub fn run(self, app: App) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        let app = &app;
        let max_body = self.max_body;
        // The accept loop stays on this thread. The scope ends only after
        // every spawned handler has returned, so in-flight requests finish
        // once `incoming_requests` stops on shutdown.
        pool.in_place_scope(|scope| {
            for request in self.server.incoming_requests() {
                scope.spawn(move |_| {
                    if let Err(e) = handle_request(request, app, max_body) {
                        log!("serve"; "request error: {e}");
                    }
                });
            }
        });
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, app: &App, max_body: usize) -> Result<()> {
    if core::is_shutdown() {
        return response::send(request, Reply::unavailable());
    }

    let method = request.method().clone();
    let url = request.url().to_string();

    let body = match read_body(&mut request, max_body)? {
        Some(body) => body,
        None => {
            debug!("serve"; "{method} {url} -> 413");
            return response::send(request, Reply::text(413, "Payload Too Large"));
        }
    };

    let reply = app.handle(&IncomingRequest {
        method: method.clone(),
        url: url.clone(),
        body,
    });
    debug!("serve"; "{method} {url} -> {}", reply.status);
    response::send(request, reply)
}

/// Read the whole body, or `None` when it exceeds `max_body`.
fn read_body(request: &mut Request, max_body: usize) -> Result<Option<Vec<u8>>> {
    if request.body_length().is_some_and(|len| len > max_body) {
        return Ok(None);
    }

    let mut body = Vec::new();
    let limit = u64::try_from(max_body).unwrap_or(u64::MAX).saturating_add(1);
    request
        .as_reader()
        .take(limit)
        .read_to_end(&mut body)
        .context("failed to read request body")?;

    if body.len() > max_body {
        return Ok(None);
    }
    Ok(Some(body))
}
