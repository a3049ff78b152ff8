//! logging
//!
//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is `repodesk=info`,
//! `repodesk=debug` with `--debug`, or `repodesk=warn` with `--quiet`.
//! Events go to stderr; command output stays on stdout.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_flags(debug: bool, quiet: bool) -> Self {
        match (debug, quiet) {
            (true, _) => Verbosity::Debug,
            (false, true) => Verbosity::Quiet,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "repodesk=warn",
            Verbosity::Normal => "repodesk=info",
            Verbosity::Debug => "repodesk=debug,tower_http=debug",
        }
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(verbosity: Verbosity) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity == Verbosity::Debug),
        )
        .try_init()
        .is_ok()
}
