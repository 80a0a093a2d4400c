//! Tandem CLI - run a client build and a server build side by side.
//!
//! `tandem dev` cleans the build directory, runs the client build in watch
//! mode and serves it with hot reload. When a server is configured it also
//! rebuilds the server on every source change and keeps it running under a
//! supervisor, restarting it after each good build.
//!
//! # Architecture
//!
//! - [`dev`] - The session state machine and the pieces it drives
//! - [`commands`] - `dev` and `check` command implementations
//! - [`config`] - Configuration loading, layering and validation
//! - [`cli`] - Argument parsing
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - User-facing progress lines
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     // CLI command implementations...
//!     Ok(())
//! }
//! ```

// Public modules
pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use error::{CliError, ConfigError, Result, ResultExt};
