//! Tracing setup for the physio CLI and tests.
//!
//! Results go to stdout, so diagnostics always go to stderr and stay at
//! `warn` unless asked for.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events follow the verbosity flag
const OWN_TARGETS: &[&str] = &["physio_core", "physio"];

/// Level for a `-v` count: 0 warn, 1 info, 2 debug, more trace
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives raising our own crates to the verbosity level
///
/// Dependencies stay at `warn` either way.
pub fn directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    let mut out = String::from("warn");
    for target in OWN_TARGETS {
        out.push_str(&format!(",{}={}", target, level));
    }
    out
}

/// Install the stderr subscriber. RUST_LOG, when set, wins over `verbosity`.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(directives(2)))
        .try_init();
}
