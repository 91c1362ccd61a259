//! Structured logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the level follows the CLI flags.

use tracing_subscriber::EnvFilter;

/// Log level for the crate given `-q` and the `-v` count.
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber, writing to stderr.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(verbosity: u8, quiet: bool) {
    let level = level_for(verbosity, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,batchscribe={}", level)));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_thread_ids(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
