//! Logging configuration for data-agent.
//!
//! Logs go to stderr by default so stdout carries only the JSON answer.
//! With `--log-file` they are appended to that file instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to `log_file`, or to stderr when no file is given.
pub fn init(log_file: Option<&Path>) {
    match log_file {
        Some(path) => init_file_logging(path),
        None => init_stderr_logging(),
    }
}

/// Initializes logging to a file.
///
/// Falls back to stderr if the file cannot be opened.
pub fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging();
            return;
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {e}");
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
