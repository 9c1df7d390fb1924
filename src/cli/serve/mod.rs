//! Development server with live reload support.
//!
//! Serves the output directory over HTTP while the Supervisor rebuilds the
//! artifact and pushes reloads over the WebSocket listener.

mod env;
mod lifecycle;
mod path;
mod response;

pub use env::{ENV_JS, write_env_js};
pub use lifecycle::ServeUrls;

use crate::{
    actor::Supervisor,
    config::DevConfig,
    core::{Shutdown, setup_shutdown_handler},
    debug, log,
    utils::path::display_relative,
};
use anyhow::{Context, Result};
use path::Resolved;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Run the dev server until Ctrl+C.
pub fn serve(config: &DevConfig) -> Result<()> {
    // Bind HTTP first so a busy port fails before anything is built
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let urls = ServeUrls::new(addr);

    let shutdown = Shutdown::new();
    setup_shutdown_handler(shutdown.clone(), Arc::clone(&server))?;

    log!("serve"; "{}", urls.local);
    if let Some(network) = &urls.network {
        log!("serve"; "{}", network);
    }

    let mut supervisor = Supervisor::new(config, shutdown.clone()).with_banner(urls.banner());
    let live_port = supervisor.start()?;

    let serve_dir = config.serve_dir();
    let env_path = write_env_js(&serve_dir, live_port)
        .with_context(|| format!("Failed to write {}", serve_dir.join(ENV_JS).display()))?;
    debug!("serve"; "wrote {}", display_relative(&env_path, &config.root));
    if config.serve.open
        && let Err(e) = webbrowser::open(&urls.local)
    {
        debug!("serve"; "failed to open browser: {}", e);
    }

    let result = run_request_loop(&server, serve_dir, &shutdown);
    supervisor.stop();
    result
}

fn run_request_loop(server: &Server, serve_dir: PathBuf, shutdown: &Shutdown) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("failed to create request thread pool")?;
    let serve_dir = Arc::new(serve_dir);

    for request in server.incoming_requests() {
        let serve_dir = Arc::clone(&serve_dir);
        let shutdown = shutdown.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &serve_dir, &shutdown) {
                debug!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, serve_dir: &Path, shutdown: &Shutdown) -> Result<()> {
    if shutdown.is_triggered() {
        return response::respond_unavailable(request);
    }
    if !response::is_allowed_method(&request) {
        return response::respond_method_not_allowed(request);
    }

    match path::resolve(request.url(), serve_dir) {
        Resolved::File(path) | Resolved::Fallback(path) => response::respond_file(request, &path),
        Resolved::NotFound => response::respond_not_found(request),
    }
}
