//! Logging infrastructure for the Tandem CLI.
//!
//! Structured diagnostics (watch events, spawned commands, port probing) go
//! through `tracing`. The user-facing progress lines live in [`crate::ui`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting session");
//! debug!(port = 3000, "probing port");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used by `--verbose`.
pub const VERBOSE_FILTER: &str = "tandem=debug,tandem_cli=debug";

/// Filter used by `--quiet`.
pub const QUIET_FILTER: &str = "tandem=error,tandem_cli=error";

/// Filter used when neither flag nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "tandem=info,tandem_cli=info";

/// Initialize the tracing subscriber with the specified options.
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for tandem crates
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable
/// 4. Default: INFO for tandem crates
///
/// Must be called once, before any logging occurs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Build the filter for the given verbosity flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
