//! Tandem CLI - development server for client/server projects.
//!
//! Handles command-line argument parsing, logging initialization, and
//! command dispatch.

use clap::Parser;
use miette::Result;
use tandem_cli::{cli, commands, error, logger, ui, CliError};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = cli::Cli::parse();

    // Initialize logging and colors based on global flags
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors_with(args.no_color);

    let result = match args.command {
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
    };

    // The supervised server's exit status becomes ours
    if let Err(CliError::ServerExited { code }) = result {
        ui::error(&format!("Server process exited with status {}", code));
        std::process::exit(code);
    }

    // Convert CLI errors to miette diagnostics for beautiful error reporting
    result.map_err(error::cli_error_to_miette)
}
