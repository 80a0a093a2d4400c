//! Development session.
//!
//! Runs a client build and an optional server build side by side:
//! - Client compiles are served by a small dev server that pushes a reload
//!   event to browsers after every good build
//! - Server compiles are triggered after client builds and by changes under
//!   the server source tree, and restart a supervised server process
//! - Both listeners wait for their port to be free before binding
//!
//! [`session`] holds the sequencing rules as a pure state machine; the other
//! modules are the pieces it drives.

pub mod compiler;
pub mod config;
pub mod port;
pub mod server;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod watcher;

// Re-exports
pub use compiler::{CommandCompiler, CompileStats, Compiler, OutputOptions};
pub use config::{DevConfig, ServiceAddr};
pub use port::{wait_until_free, PortProbe, TcpProbe};
pub use session::{Checkpoint, DevSession, Effect, Latch, Level, PortTarget, SessionEvent, SessionPlan};
pub use state::{BundleCache, DevServerState, HmrEvent, SharedState};
pub use supervisor::{LaunchOptions, Supervisor, SupervisorEvent};
pub use watcher::{ChangeKind, Debouncer, FileChange, FileWatcher};
