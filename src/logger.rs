// Flowboard — Structured logging via tracing

use crate::tui::activity::{ActivityLog, TuiLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("FLOWBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber on stderr.
///
/// Log level is controlled by the `FLOWBOARD_LOG` env var (default: `info`).
/// Examples:
///   FLOWBOARD_LOG=debug
///   FLOWBOARD_LOG=flowboard::api=trace,info
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Route events into the dashboard's activity log instead of the terminal,
/// which is owned by the UI while it runs.
pub fn init_for_tui(activity: ActivityLog) {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(TuiLayer::new(activity))
        .init();
}

/// Initialize logger for tests (does not panic if called multiple times).
#[cfg(test)]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
