//! Tracing subscriber setup.
//!
//! Logs go to stderr so `metro-panel produce` can keep stdout for the wire.
//!
//! # Priority (highest to lowest)
//!
//! 1. `METRO_PANEL_LOG` (per-target directives, e.g. `metro_panel=debug,warn`)
//! 2. `RUST_LOG`
//! 3. CLI flags (`-v` → debug, `-q` → errors only)
//! 4. Default level: `info`

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "METRO_PANEL_LOG";

/// Verbosity level derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: Verbosity) {
    let filter = build_env_filter(
        verbosity,
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbosity == Verbosity::Verbose);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// `METRO_PANEL_LOG` > `RUST_LOG` > verbosity default. Unparseable
/// directives fall through to the next source with a note on stderr.
fn build_env_filter(
    verbosity: Verbosity,
    panel_log: Option<String>,
    rust_log: Option<String>,
) -> EnvFilter {
    for (name, directives) in [(LOG_ENV, panel_log), (EnvFilter::DEFAULT_ENV, rust_log)] {
        let Some(directives) = directives else {
            continue;
        };
        match EnvFilter::try_new(&directives) {
            Ok(filter) => return filter,
            Err(err) => eprintln!("invalid {}, ignoring it - {}", name, err),
        }
    }
    EnvFilter::new(verbosity.default_level().to_string())
}
