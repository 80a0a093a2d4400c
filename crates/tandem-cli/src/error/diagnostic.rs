//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ConfigError};
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::ServerExited { code } => miette::miette!(
            help = "The server exited on its own; fix the crash and run `tandem dev` again",
            "Server process exited with status {}",
            code
        ),
        _ => miette::miette!("{}", err),
    }
}

/// Convert ConfigError to miette Report
pub fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::MissingField { field, hint } => {
            miette::miette!(help = hint, "Missing required field: {}", field)
        }
        ConfigError::InvalidValue { field, value, hint } => {
            miette::miette!(help = hint, "Invalid value for '{}': {}", field, value)
        }
        _ => miette::miette!("Configuration error: {}", err),
    }
}
