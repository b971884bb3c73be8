//! Logging configuration for opendata-glance.
//!
//! Logs go to stderr so that table and JSON output on stdout stays clean
//! enough to pipe into other tools.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` is used
/// (e.g. `"warn"` for normal CLI runs, `"debug"` with `-v`).
pub fn init_stderr_logging(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from_env(default_directive))
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the env filter, falling back to `default_directive`.
fn filter_from_env(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Maps the number of `-v` flags to a default log directive.
pub fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
