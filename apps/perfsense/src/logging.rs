//! Diagnostic logging setup.
//!
//! Logs go to stderr so that `--output json` keeps stdout machine-readable.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "PERFSENSE_LOG";

/// Filter precedence: `PERFSENSE_LOG`, then `RUST_LOG`, then `warn`
/// (`debug` when verbose).
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

pub fn init(verbose: bool) {
    fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .ok();
}
