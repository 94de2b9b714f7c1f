//! Logging setup: console output with local-timezone timestamps and an
//! optional daily-rotated file layer.

use std::path::Path;

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "notibox=info,livefeed=info";

/// Custom timer that uses the local timezone via chrono, so log lines
/// correlate with local time.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Initialize logging.
///
/// Returns a worker guard to keep alive for the process lifetime when file
/// output is enabled.
pub fn init(verbose: bool, quiet: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_directive = if quiet {
        "notibox=error,livefeed=error"
    } else if verbose {
        "notibox=debug,livefeed=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Diagnostics go to stderr; stdout is reserved for command output.
    let console = fmt::layer()
        .with_ansi(true)
        .with_timer(LocalTimer)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(console);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "notibox.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            registry
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_timer(LocalTimer),
                )
                .try_init()
                .map_err(|e| Error::other(format!("Failed to set subscriber: {e}")))?;
            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .map_err(|e| Error::other(format!("Failed to set subscriber: {e}")))?;
            Ok(None)
        }
    }
}
