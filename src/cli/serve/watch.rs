//! Source watcher: rebuilds the served output when the source folder changes.
//!
//! ```text
//! notify ─► notify_rx ─► Debouncer ─► run_build ─► WatchStatus
//!                 shutdown_rx ─┘
//! ```
//!
//! The watcher is attached before the thread starts, so edits made while the
//! server binds are not lost.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::debouncer::{ChangeKind, Debouncer};
use crate::logger::{is_verbose, status_detach, status_error, status_success};
use crate::pipeline::{BuildRequest, run_build};
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Start watching `request.origin` and spawn the rebuild loop.
pub fn spawn_watcher(request: &BuildRequest, shutdown_rx: Receiver<()>) -> Result<JoinHandle<()>> {
    let (notify_tx, notify_rx) = channel::unbounded();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })
    .context("failed to create file watcher")?;

    watcher
        .watch(&request.origin, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", request.origin.display()))?;

    log!("watch"; "watching {}", request.origin.display());

    // rebuilds replace whatever the previous build left behind
    let mut request = request.clone();
    request.options.overwrite = true;

    let handle = thread::Builder::new()
        .name("watch".into())
        .spawn(move || watch_loop(watcher, &request, &notify_rx, &shutdown_rx))
        .context("failed to spawn watcher thread")?;

    Ok(handle)
}

fn watch_loop(
    // dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    request: &BuildRequest,
    notify_rx: &Receiver<notify::Result<notify::Event>>,
    shutdown_rx: &Receiver<()>,
) {
    let mut debouncer = Debouncer::new();

    loop {
        crossbeam::select! {
            recv(notify_rx) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(e)) => log!("watch"; "notify error: {}", e),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
            default(debouncer.sleep_duration()) => {}
        }

        if crate::core::is_shutdown() {
            break;
        }

        if let Some(batch) = debouncer.take_if_ready() {
            rebuild(request, &batch);
        }
    }

    debug!("watch"; "watcher stopped");
}

fn rebuild(request: &BuildRequest, batch: &[(PathBuf, ChangeKind)]) {
    for (path, kind) in batch {
        debug!("watch"; "{}: {}", kind.label(), path.display());
    }

    match run_build(request, |_| Ok(true), false) {
        Ok(report) => {
            let message = format!(
                "rebuilt: {} ({}, {} ms)",
                describe_batch(request, batch),
                plural_count(report.documents, "document"),
                report.elapsed.as_millis()
            );
            status_success(&message);
        }
        Err(e) => status_error("rebuild failed", &e.to_string()),
    }

    // verbose output interleaves with the status block
    if is_verbose() {
        status_detach();
    }
}

/// `a.html`, or `a.html (+2 more)`, relative to the source folder.
fn describe_batch(request: &BuildRequest, batch: &[(PathBuf, ChangeKind)]) -> String {
    let Some((first, _)) = batch.first() else {
        return String::new();
    };
    let shown = first.strip_prefix(&request.origin).unwrap_or(first).display();
    match batch.len() {
        1 => shown.to_string(),
        n => format!("{} (+{} more)", shown, n - 1),
    }
}
