//! Centralised tracing initialisation for the `tagdiff` binary.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting.
//! Later calls are ignored; the global subscriber can only be set once per
//! process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON log lines instead of text.
/// * `level`: default verbosity when `RUST_LOG` is not set.
///
/// Logs go to stderr so stdout stays clean for command output.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

/// Level picked by the CLI's `--verbose` / `--debug` flags.
pub fn level_for(verbose: bool, debug: bool) -> Level {
    if debug {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}
