//! Supervised server process.
//!
//! Runs `<exec> <args...> <script>` with the server address in its
//! environment, kills and respawns it on restart, and reports when it exits
//! on its own.

use crate::dev::config::ServiceAddr;
use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Lifecycle notifications from the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The process was spawned for the first time
    Started,
    /// The process was killed and spawned again
    Restarted,
    /// The process exited without being asked to
    Quit { code: i32 },
}

/// How to launch the server process.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Program that runs the script
    pub exec: String,
    /// Arguments placed before the script path
    pub args: Vec<String>,
    /// Built server script
    pub script: PathBuf,
    /// Working directory
    pub cwd: PathBuf,
    /// Address the process should listen on
    pub addr: ServiceAddr,
}

struct Running {
    pid: Option<u32>,
    kill: oneshot::Sender<()>,
    waiter: JoinHandle<()>,
}

/// Keeps at most one server process alive.
pub struct Supervisor {
    options: LaunchOptions,
    events: mpsc::Sender<SupervisorEvent>,
    current: Option<Running>,
}

impl Supervisor {
    /// Create a supervisor that reports lifecycle events on `events`.
    pub fn new(options: LaunchOptions, events: mpsc::Sender<SupervisorEvent>) -> Self {
        Self {
            options,
            events,
            current: None,
        }
    }

    /// Whether a process is currently running.
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// PID of the running process.
    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().and_then(|running| running.pid)
    }

    /// Spawn the process.
    ///
    /// Returns `false` without doing anything if it is already running.
    ///
    /// # Errors
    ///
    /// Returns error if the process can't be spawned
    pub async fn start(&mut self) -> Result<bool> {
        if self.current.is_some() {
            return Ok(false);
        }

        let child = self.spawn()?;
        self.notify(SupervisorEvent::Started).await;
        self.current = Some(self.track(child));
        Ok(true)
    }

    /// Kill the running process, wait for it, and spawn it again.
    ///
    /// Returns `false` without doing anything if nothing was started yet.
    ///
    /// # Errors
    ///
    /// Returns error if the new process can't be spawned
    pub async fn restart(&mut self) -> Result<bool> {
        if self.current.is_none() {
            return Ok(false);
        }

        self.stop().await;
        let child = self.spawn()?;
        self.notify(SupervisorEvent::Restarted).await;
        self.current = Some(self.track(child));
        Ok(true)
    }

    /// Kill the running process, if any, and wait for it to exit.
    pub async fn shutdown(&mut self) {
        self.stop().await;
    }

    async fn stop(&mut self) {
        if let Some(running) = self.current.take() {
            tracing::debug!(pid = ?running.pid, "stopping server process");
            let _ = running.kill.send(());
            if let Err(e) = running.waiter.await {
                tracing::warn!("server process waiter failed: {}", e);
            }
        }
    }

    fn spawn(&self) -> Result<Child> {
        let options = &self.options;

        tracing::debug!(
            exec = %options.exec,
            args = ?options.args,
            script = %options.script.display(),
            "spawning server process"
        );

        Command::new(&options.exec)
            .args(&options.args)
            .arg(&options.script)
            .current_dir(&options.cwd)
            .env("PORT", options.addr.port.to_string())
            .env("HOST", &options.addr.hostname)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CliError::Supervisor(format!("Failed to launch `{}`: {}", options.exec, e))
            })
    }

    /// Hand the child to a waiter task. Lifecycle events for the spawn must
    /// already be sent so a quick exit can't overtake them.
    fn track(&self, child: Child) -> Running {
        let pid = child.id();
        let (kill, killed) = oneshot::channel();
        let waiter = tokio::spawn(watch_child(child, killed, self.events.clone()));

        Running { pid, kill, waiter }
    }

    async fn notify(&self, event: SupervisorEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!(?event, "supervisor event dropped, receiver gone");
        }
    }
}

/// Wait for the child to exit, or kill it when asked.
///
/// Only an exit nobody asked for is reported.
async fn watch_child(
    mut child: Child,
    killed: oneshot::Receiver<()>,
    events: mpsc::Sender<SupervisorEvent>,
) {
    tokio::select! {
        status = child.wait() => {
            let code = match status {
                Ok(status) => status.code().unwrap_or(1),
                Err(e) => {
                    tracing::warn!("failed to wait for server process: {}", e);
                    1
                }
            };
            tracing::debug!(code, "server process exited");
            let _ = events.send(SupervisorEvent::Quit { code }).await;
        }
        _ = killed => {
            if let Err(e) = child.kill().await {
                tracing::warn!("failed to kill server process: {}", e);
            }
        }
    }
}
