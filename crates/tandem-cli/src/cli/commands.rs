use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// Available Tandem subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a development session
    ///
    /// Cleans the build directory, runs the client build in watch mode and
    /// serves it with hot reload. When a server is configured, also builds,
    /// watches and supervises it, restarting it after every good build.
    Dev(DevArgs),

    /// Validate configuration
    ///
    /// Loads tandem.config.json, environment overrides and flags, validates
    /// the result and prints the resolved session layout.
    Check(CheckArgs),
}

/// Arguments for the dev command
#[derive(Args, Debug)]
pub struct DevArgs {
    /// Path to tandem.config.json
    ///
    /// Relative paths are resolved against the working directory. If not
    /// provided, tandem.config.json is used when present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory
    ///
    /// Build commands run here and relative paths are resolved against it.
    /// Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Override the port of clientURL
    #[arg(long, value_name = "PORT")]
    pub client_port: Option<u16>,

    /// Override the port of serverURL
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Run the client only, even if a server is configured
    #[arg(long)]
    pub no_server: bool,

    /// Announce React Hot Loader setup once the client is ready
    #[arg(long)]
    pub hot_loader: bool,
}

impl From<&DevArgs> for Overrides {
    fn from(args: &DevArgs) -> Self {
        Self {
            client_port: args.client_port,
            server_port: args.server_port,
            no_server: args.no_server,
            hot_loader: args.hot_loader,
        }
    }
}

/// Arguments for the check command (configuration validation)
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to tandem.config.json
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Print the configuration JSON schema and exit
    #[arg(long, conflicts_with = "config")]
    pub schema: bool,

    /// Print an example configuration file and exit
    #[arg(long, conflicts_with_all = ["config", "schema"])]
    pub example: bool,
}
