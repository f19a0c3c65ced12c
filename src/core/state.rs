//! Shutdown state for serve mode.
//!
//! Ctrl+C has to release two things the normal control flow would only
//! release on return: the HTTP server blocked in its accept loop, and the
//! scratch output directory a `--serve` run builds into.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use parking_lot::Mutex;
use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Stops the watcher thread
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Scratch output directory removed on Ctrl+C
static SCRATCH_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// - Before `register_server()`: remove the scratch directory and exit.
/// - After `register_server()`: also stop the watcher and unblock the
///   server, so `main` returns normally.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        remove_scratch_dir();

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server and the watcher's stop channel.
pub fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the directory a Ctrl+C must delete.
pub fn register_scratch_dir(path: &Path) {
    *SCRATCH_DIR.lock() = Some(path.to_path_buf());
}

fn remove_scratch_dir() {
    if let Some(dir) = SCRATCH_DIR.lock().take() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

/// Uses Relaxed ordering: a request or two served after Ctrl+C is fine.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
