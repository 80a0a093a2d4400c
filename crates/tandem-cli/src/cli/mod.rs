//! Command-line interface definition for Tandem.
//!
//! Defines the CLI structure using clap v4's derive macros.
//!
//! # Command Structure
//!
//! - `tandem dev` - Build, watch, serve and supervise a project
//! - `tandem check` - Validate configuration without starting anything

mod commands;
mod tests;

use clap::Parser;

pub use commands::{CheckArgs, Command, DevArgs};

/// Tandem - run a client build and a server build side by side
#[derive(Parser, Debug)]
#[command(
    name = "tandem",
    version,
    about = "Development server for client/server JavaScript projects",
    long_about = "Tandem runs your client build in watch mode, serves it with hot reload,\n\
                  and rebuilds and restarts your server whenever its sources change.\n\
                  Bundling itself is left to the build commands you configure."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows watch events, spawned commands and port probing.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Outputs plain text without ANSI color codes. Useful for logging to
    /// files or systems that don't support colored terminal output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
