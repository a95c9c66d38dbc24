//! Banner and progress display for the CLI.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    // Avoid panics when the version exceeds the expected width
    let spaces = " ".repeat(24usize.saturating_sub(version.len()));
    let title = "DBSENTRY".bold().magenta();
    eprintln!(
        r#"
    ╭──────────────────────────────────────╮
    │                                      │
    │          {title}  SCANNER           │
    │                                      │
    │     Database Security Static         │
    │     Analysis for Python              │
    │     Version: {version}{spaces}│
    │                                      │
    ╰──────────────────────────────────────╯
"#
    );
}

/// Single-line job progress on stderr.
///
/// Renders only when stderr is attached to a terminal; in CI and
/// redirections updates are skipped to avoid noisy logs. Redraws are
/// throttled, the final state is always drawn.
pub struct ProgressLine {
    state: Mutex<ProgressState>,
}

struct ProgressState {
    last_draw: Option<Instant>,
    last_len: usize,
}

const MIN_INTERVAL: Duration = Duration::from_millis(75);

impl ProgressLine {
    pub fn new() -> Option<Self> {
        if !io::stderr().is_terminal() {
            return None;
        }
        Some(Self {
            state: Mutex::new(ProgressState {
                last_draw: None,
                last_len: 0,
            }),
        })
    }

    pub fn update(&self, done: usize, total: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let throttled = state
            .last_draw
            .is_some_and(|last| now.duration_since(last) < MIN_INTERVAL);
        if throttled && done < total {
            return;
        }
        state.last_draw = Some(now);
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 / total as f64 * 100.0
        };
        let message = format!("▸ Scan progress | jobs {done}/{total} | {percent:6.2}%");
        let padding = if state.last_len > message.len() {
            " ".repeat(state.last_len - message.len())
        } else {
            String::new()
        };
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r{message}{padding}");
        let _ = stderr.flush();
        state.last_len = message.len();
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.last_len > 0 {
            let _ = writeln!(io::stderr());
        }
    }
}
