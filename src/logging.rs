//! Log output for the command-line tool
//!
//! Progress lines (`Folding 2 patches into "pkg"`) and warnings go to
//! stderr through a `tracing-subscriber` fmt layer. `QUAHOG_LOG` takes an
//! `EnvFilter` directive; without it the level is `info`, or `debug` with
//! `--verbose`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "QUAHOG_LOG";

/// Filter from `QUAHOG_LOG`, falling back to the default level
pub fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .init();
}
