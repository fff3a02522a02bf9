//! Tracing setup: compact stdout output plus an optional append-only log file.
//!
//! File logging goes to `PAGECHAT_LOG_FILE` when set, falling back to
//! `logs/pagechat.log`. The file writer is non-blocking so request handling
//! never stalls on log IO; a process-wide guard keeps it flushing until exit.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the tracing subscriber for the process.
///
/// `RUST_LOG` controls filtering and defaults to `info`. Stdout always gets a
/// compact layer; the file layer is skipped when the log file cannot be opened.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = file_writer().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

/// Open the log file and wrap it in a non-blocking writer.
///
/// Failures fall back to stdout-only logging and are reported on stderr,
/// since the subscriber is not installed yet.
fn file_writer() -> Option<NonBlocking> {
    let path = match std::env::var("PAGECHAT_LOG_FILE") {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => {
            if let Err(error) = std::fs::create_dir_all("logs") {
                eprintln!("Failed to create logs directory: {error}");
                return None;
            }
            PathBuf::from("logs").join("pagechat.log")
        }
    };

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(writer)
        }
        Err(error) => {
            eprintln!("Failed to open log file {}: {error}", path.display());
            None
        }
    }
}
