//! Development server: serves the build output and rebuilds on change.

mod debouncer;
mod lifecycle;
mod path;
mod response;
mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::ForgeConfig;
use crate::pipeline::BuildRequest;
use crate::{debug, log};

/// Serve `request.target` until Ctrl+C, rebuilding it from `request.origin`
/// whenever the source changes.
pub fn serve(request: &BuildRequest, config: &ForgeConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    let watcher = watch::spawn_watcher(request, shutdown_rx)?;
    run_request_loop(&server, &request.target)?;
    lifecycle::wait_for_shutdown(Some(watcher));
    Ok(())
}

fn run_request_loop(server: &Server, serve_root: &Path) -> Result<()> {
    // a slow response must not stall the rest
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .thread_name(|i| format!("serve-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let serve_root = serve_root.to_path_buf();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &serve_root) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, serve_root: &Path) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !response::is_readable_method(request.method()) {
        return response::respond_method_not_allowed(request);
    }

    debug!("serve"; "{} {}", request.method(), request.url());

    match path::resolve_path(request.url(), serve_root) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request, serve_root),
    }
}
