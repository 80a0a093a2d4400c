//! Dev command implementation.
//!
//! Owns everything with side effects: compilers, watchers, the client dev
//! server and the server supervisor. Events from all of them are funneled
//! into one loop, handed to the [`DevSession`] one at a time, and the effects
//! it returns are carried out in order.

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::config::Overrides;
use crate::dev::{
    server, wait_until_free, Checkpoint, CommandCompiler, CompileStats, Compiler, DevConfig,
    DevServerState, DevSession, Effect, FileChange, FileWatcher, LaunchOptions, Level, PortProbe,
    PortTarget, SessionEvent, SessionPlan, SharedState, Supervisor, SupervisorEvent, TcpProbe,
};
use crate::error::{CliError, Result};
use crate::ui;
use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;

/// Execute the dev command.
///
/// Runs until interrupted (success) or until the supervised server quits
/// (its exit status).
///
/// # Errors
///
/// Returns errors for:
/// - Invalid configuration
/// - A build directory that can't be removed
/// - Client dev server or supervisor failures
/// - A server process that exited with a failure status
pub async fn execute(args: DevArgs) -> Result<()> {
    let cwd = utils::resolve_cwd(args.cwd.as_deref())?;
    let config = utils::load_dev_config(&cwd, args.config.as_deref(), &Overrides::from(&args))?;

    DevRunner::new(config, Arc::new(TcpProbe))
        .run(interrupted())
        .await
}

/// Resolves on Ctrl+C. Never resolves if the handler can't be installed.
async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// One development session and the collaborators it drives.
pub struct DevRunner {
    config: DevConfig,
    session: DevSession,
    probe: Arc<dyn PortProbe>,
    poll_interval: Duration,
    client: Arc<dyn Compiler>,
    server: Arc<dyn Compiler>,
    state: SharedState,
    supervisor: Supervisor,
    events: mpsc::Sender<SessionEvent>,
    inbox: mpsc::Receiver<SessionEvent>,
    supervisor_events: mpsc::Receiver<SupervisorEvent>,
    watchers: Vec<FileWatcher>,
}

impl DevRunner {
    /// Wire up a session for `config`, checking ports with `probe`.
    pub fn new(config: DevConfig, probe: Arc<dyn PortProbe>) -> Self {
        let client: Arc<dyn Compiler> =
            Arc::new(CommandCompiler::from_spec(&config.client, &config.cwd));
        let server: Arc<dyn Compiler> =
            Arc::new(CommandCompiler::from_spec(&config.server, &config.cwd));

        let state = Arc::new(DevServerState::new(
            client.output().path.clone(),
            &client.output().public_path,
        ));

        let (supervisor_tx, supervisor_events) = mpsc::channel(16);
        let supervisor = Supervisor::new(
            LaunchOptions {
                exec: config.server_process.exec.clone(),
                args: config.server_process.args.clone(),
                script: config.server_script(),
                cwd: config.cwd.clone(),
                addr: config.server_addr.clone(),
            },
            supervisor_tx,
        );

        let (events, inbox) = mpsc::channel(256);
        let session = DevSession::new(SessionPlan::from_config(&config));

        Self {
            config,
            session,
            probe,
            poll_interval: crate::dev::port::DEFAULT_POLL_INTERVAL,
            client,
            server,
            state,
            supervisor,
            events,
            inbox,
            supervisor_events,
            watchers: Vec::new(),
        }
    }

    /// Change how often an occupied port is probed.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// State shared with the client dev server.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Run the session until `shutdown` resolves or the server process quits.
    ///
    /// # Errors
    ///
    /// See [`execute`]
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let cleaned = utils::remove_build_dir(&self.config.build_path)?
            .then(|| self.config.build_path_display.clone());

        let mut pending: VecDeque<Effect> = self.session.begin(cleaned).into();
        tokio::pin!(shutdown);

        let result = loop {
            match self.drain(&mut pending).await {
                Ok(Some(code)) => break exit_status(code),
                Ok(None) => {}
                Err(e) => break Err(e),
            }

            tokio::select! {
                Some(event) = self.inbox.recv() => {
                    pending.extend(self.session.handle(event));
                }
                Some(event) = self.supervisor_events.recv() => {
                    pending.extend(self.session.handle(SessionEvent::Supervisor(event)));
                }
                _ = &mut shutdown => {
                    ui::info("Shutting down development session...");
                    break Ok(());
                }
            }
        };

        self.supervisor.shutdown().await;
        result
    }

    /// Execute queued effects in order. Returns the exit status once the
    /// session asks to shut down.
    async fn drain(&mut self, pending: &mut VecDeque<Effect>) -> Result<Option<i32>> {
        while let Some(effect) = pending.pop_front() {
            if let Some(code) = self.execute(effect).await? {
                return Ok(Some(code));
            }
        }
        Ok(None)
    }

    async fn execute(&mut self, effect: Effect) -> Result<Option<i32>> {
        tracing::trace!(?effect, "executing effect");

        match effect {
            Effect::Report(checkpoint) => report(&checkpoint),
            Effect::AwaitPort { target, port } => self.await_port(target, port),
            Effect::MountClient => self.mount_client().await?,
            Effect::WatchClient => self.watch(
                self.config.client_watch.clone(),
                self.config.debounce,
                SessionEvent::ClientSourceChanged,
            )?,
            Effect::WatchServer => self.watch(
                vec![self.config.server_src_path.clone()],
                Duration::ZERO,
                SessionEvent::ServerSourceChanged,
            )?,
            Effect::CompileClient => {
                self.compile(Arc::clone(&self.client), SessionEvent::ClientCompiled)
            }
            Effect::PublishClient { duration } => self.publish(duration).await,
            Effect::CompileServer => {
                self.compile(Arc::clone(&self.server), SessionEvent::ServerCompiled)
            }
            Effect::StartServer => {
                self.supervisor.start().await?;
            }
            Effect::RestartServer => {
                if !self.supervisor.restart().await? {
                    tracing::debug!("server rebuilt before its first start, nothing to restart");
                }
            }
            Effect::Shutdown { code } => return Ok(Some(code)),
            Effect::Abort { reason } => return Err(CliError::Server(reason)),
        }

        Ok(None)
    }

    fn await_port(&self, target: PortTarget, port: u16) {
        let host = match target {
            PortTarget::Client => self.config.client_addr.hostname.clone(),
            PortTarget::Server => self.config.server_addr.hostname.clone(),
        };
        let probe = Arc::clone(&self.probe);
        let interval = self.poll_interval;
        let events = self.events.clone();

        tokio::spawn(async move {
            wait_until_free(probe.as_ref(), &host, port, interval).await;
            let _ = events.send(SessionEvent::PortFree(target)).await;
        });
    }

    async fn mount_client(&self) -> Result<()> {
        let listener = server::bind(&self.config.client_addr).await?;
        tracing::debug!(addr = %self.config.client_addr.origin, "client dev server listening");

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            let error = match server::serve(listener, state).await {
                Ok(()) => "serve loop ended".to_string(),
                Err(e) => e.to_string(),
            };
            let _ = events.send(SessionEvent::DevServerStopped { error }).await;
        });

        Ok(())
    }

    /// Watch `roots` and forward every change into the session.
    ///
    /// Roots that don't exist are skipped with a warning.
    fn watch(
        &mut self,
        roots: Vec<PathBuf>,
        debounce: Duration,
        wrap: fn(FileChange) -> SessionEvent,
    ) -> Result<()> {
        let (present, missing): (Vec<_>, Vec<_>) =
            roots.into_iter().partition(|root| root.is_dir());

        for root in &missing {
            ui::warning(&format!(
                "Not watching {}: directory does not exist",
                root.display()
            ));
        }
        if present.is_empty() {
            return Ok(());
        }

        let (watcher, mut changes) =
            FileWatcher::new(present, self.config.watch_ignore.clone(), debounce)?;
        for root in watcher.roots() {
            tracing::debug!(root = %root.display(), "watching for changes");
        }

        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                if events.send(wrap(change)).await.is_err() {
                    break;
                }
            }
        });

        self.watchers.push(watcher);
        Ok(())
    }

    fn compile(&self, compiler: Arc<dyn Compiler>, wrap: fn(CompileStats) -> SessionEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            let stats = compiler.run().await;
            let _ = events.send(wrap(stats)).await;
        });
    }

    async fn publish(&self, duration: Duration) {
        match self.state.publish(duration).await {
            Ok(event) => tracing::debug!(
                ?event,
                took = %ui::format_duration(duration),
                clients = self.state.client_count(),
                "client build published"
            ),
            Err(e) => ui::warning(&format!("Could not load the client build: {}", e)),
        }
    }
}

/// Print a checkpoint line at its level.
pub fn report(checkpoint: &Checkpoint) {
    let message = checkpoint.to_string();
    match checkpoint.level() {
        Level::Start => ui::start(&message),
        Level::Task => ui::task(&message),
        Level::End => ui::end(&message),
        Level::Warn => ui::warning(&message),
    }
}

/// Map the server's exit status onto the command result.
fn exit_status(code: i32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(CliError::ServerExited { code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        assert!(exit_status(0).is_ok());
        assert!(matches!(
            exit_status(3),
            Err(CliError::ServerExited { code: 3 })
        ));
    }

    #[test]
    fn test_report_every_level() {
        report(&Checkpoint::Starting);
        report(&Checkpoint::HotLoaderReady);
        report(&Checkpoint::DevelopmentStarted);
        report(&Checkpoint::ServerQuit { code: 1 });
    }
}
