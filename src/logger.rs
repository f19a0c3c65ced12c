//! Terminal output: prefixed log lines, a build progress line, and the
//! single-block status display used while serving.
//!
//! ```ignore
//! log!("build"; "{} documents", count);
//! debug!("bundle"; "writing {}", path.display()); // only with --verbose
//!
//! let progress = ProgressLine::new(&[("documents", 12)]);
//! progress.inc("documents");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Set by `--verbose`.
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Lines currently owned by a progress display (log lines go above them).
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Macros
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Log Lines
// ============================================================================

#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "warn" | "warning" => prefix.yellow().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status
// ============================================================================

/// Wall clock as `HH:MM:SS` (UTC).
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_clock(secs)
}

fn format_clock(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Status block that replaces itself on every update, so a long serve
/// session shows only the latest rebuild outcome.
pub struct WatchStatus {
    /// Lines printed by the previous message.
    last_lines: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    /// Summary line plus optional (possibly multi-line) detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        self.display(format!("{}", "✗".red()), &compose(summary, detail));
    }

    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn compose(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

/// Forget the current block, so the next status starts below any log
/// lines printed in between.
pub fn status_detach() {
    WATCH_STATUS.lock().last_lines = 0;
}

// ============================================================================
// Progress Line
// ============================================================================

/// Single-line counters, e.g. `[build] documents(3/12)`.
///
/// `inc` uses `try_lock`, so a busy display skips a refresh rather than
/// blocking the caller.
pub struct ProgressLine {
    counters: Vec<Counter>,
    lock: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Counters with a zero total are left out.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters: Vec<_> = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(name, total)| Counter {
                name,
                total: *total,
                current: AtomicUsize::new(0),
            })
            .collect();

        BAR_COUNT.store(1, Ordering::SeqCst);

        let progress = Self {
            counters,
            lock: Mutex::new(()),
        };
        progress.display(false);
        progress
    }

    pub fn inc(&self, name: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.current.fetch_add(1, Ordering::Relaxed);
        if self.lock.try_lock().is_some() {
            self.display(false);
        }
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.current.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn display(&self, newline: bool) {
        let line = format!("{} {}", colorize_prefix("build"), self.render());
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(stdout, "{line}").ok();
        } else {
            write!(stdout, "{line}").ok();
        }
        stdout.flush().ok();
    }

    /// Keep the final counts on screen and move to the next line.
    pub fn finish(self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        {
            let _guard = self.lock.lock();
            self.display(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_COUNT.store(0, Ordering::SeqCst);

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_status_new() {
        assert_eq!(WatchStatus::new().last_lines, 0);
    }

    #[test]
    fn test_error_block_line_count() {
        let message = compose("failed: index.html", "JS file not found: a.js\nfile was referenced by index.html");
        assert_eq!(line_count(&message), 3);
        assert_eq!(line_count(&compose("rebuilt", "")), 1);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3600 * 25 + 61), "01:01:01");
    }

    #[test]
    fn test_progress_skips_empty_counters() {
        let progress = ProgressLine::new(&[("documents", 2), ("bundles", 0)]);
        assert_eq!(progress.counters.len(), 1);
        progress.inc("documents");
        progress.inc("unknown");
        assert_eq!(progress.render(), "documents(1/2)");
        progress.finish();
    }
}
