//! Log setup for the binary.
//!
//! Logs go to stderr so stdout stays free for rendered output and bridge
//! protocol lines. A valid `RUST_LOG` replaces the default filter entirely;
//! otherwise the crate logs at `info`, or `debug` with `-v`.

use tracing_subscriber::EnvFilter;

use crate::env::Env;

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let rust_log = Env::real().var(EnvFilter::DEFAULT_ENV);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sidecoach=debug"
    } else {
        "sidecoach=info"
    }
}
