//! Development session core.
//!
//! [`DevSession`] is a plain state machine: the driver feeds it one
//! [`SessionEvent`] at a time and executes the [`Effect`]s it returns. It owns
//! the one-time latches ("announce the client once", "start the server once")
//! and never touches processes, sockets or the terminal itself.

use crate::dev::compiler::CompileStats;
use crate::dev::config::DevConfig;
use crate::dev::supervisor::SupervisorEvent;
use crate::dev::watcher::FileChange;
use std::fmt;
use std::mem;
use std::time::Duration;

/// Single-assignment flag.
///
/// [`Latch::fire`] returns `true` exactly once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Latch {
    fired: bool,
}

impl Latch {
    /// Create an unfired latch.
    pub const fn new() -> Self {
        Self { fired: false }
    }

    /// Fire the latch. Returns `true` only on the first call.
    pub fn fire(&mut self) -> bool {
        !mem::replace(&mut self.fired, true)
    }

    /// Whether the latch has fired.
    pub fn is_fired(&self) -> bool {
        self.fired
    }
}

/// Which listener a port check is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortTarget {
    /// The client dev server
    Client,
    /// The supervised server process
    Server,
}

/// Severity of a checkpoint line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Opens the session
    Start,
    /// Intermediate step
    Task,
    /// Something is up and running
    End,
    /// Something went wrong
    Warn,
}

/// User-facing progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    Starting,
    Cleaned { path: String },
    HotLoaderReady,
    ClientAssets { url: String },
    StartingUp { url: String },
    ClientStarted,
    ServerRunning { href: String },
    DevelopmentStarted,
    ServerRestarted,
    ServerQuit { code: i32 },
    DevServerStopped { error: String },
}

impl Checkpoint {
    /// How the line should be printed.
    pub fn level(&self) -> Level {
        match self {
            Checkpoint::Starting => Level::Start,
            Checkpoint::ClientStarted | Checkpoint::DevelopmentStarted => Level::End,
            Checkpoint::ServerQuit { .. } | Checkpoint::DevServerStopped { .. } => Level::Warn,
            _ => Level::Task,
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Starting => write!(f, "Starting development build..."),
            Checkpoint::Cleaned { path } => write!(f, "Cleaned {}", path),
            Checkpoint::HotLoaderReady => write!(f, "Setup React Hot Loader"),
            Checkpoint::ClientAssets { url } => write!(f, "Client assets serving from {}", url),
            Checkpoint::StartingUp { url } => write!(f, "Starting up server: {}", url),
            Checkpoint::ClientStarted => write!(f, "Client started"),
            Checkpoint::ServerRunning { href } => write!(f, "Server running at: {}", href),
            Checkpoint::DevelopmentStarted => write!(f, "Development started"),
            Checkpoint::ServerRestarted => write!(f, "Development server restarted"),
            Checkpoint::ServerQuit { code } => {
                write!(f, "Server process quit with status {}", code)
            }
            Checkpoint::DevServerStopped { error } => {
                write!(f, "Client dev server stopped: {}", error)
            }
        }
    }
}

/// Input to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A port the session was waiting on is free
    PortFree(PortTarget),
    /// A client compile pass finished
    ClientCompiled(CompileStats),
    /// A server compile pass finished
    ServerCompiled(CompileStats),
    /// Something changed under a client watch directory
    ClientSourceChanged(FileChange),
    /// Something changed under the server source tree
    ServerSourceChanged(FileChange),
    /// Supervised process lifecycle
    Supervisor(SupervisorEvent),
    /// The client dev server's serve loop ended
    DevServerStopped { error: String },
}

/// Work the driver must carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Print a checkpoint line
    Report(Checkpoint),
    /// Wait for a port to be free, then feed back [`SessionEvent::PortFree`]
    AwaitPort { target: PortTarget, port: u16 },
    /// Bind and serve the client dev server
    MountClient,
    /// Start watching client sources
    WatchClient,
    /// Start watching the server source tree
    WatchServer,
    /// Run a client compile pass
    CompileClient,
    /// Serve the new client build and notify browsers
    PublishClient { duration: Duration },
    /// Run a server compile pass
    CompileServer,
    /// Spawn the server process
    StartServer,
    /// Restart the server process
    RestartServer,
    /// End the session with the given exit status
    Shutdown { code: i32 },
    /// End the session with an error
    Abort { reason: String },
}

/// The parts of the configuration the session decides on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub has_server: bool,
    pub react_hot_loader: bool,
    pub client_port: u16,
    pub server_port: u16,
    /// Where client assets are served from
    pub client_public_url: String,
    /// Announced once the server process is up
    pub server_href: String,
}

impl SessionPlan {
    /// Extract the plan from a resolved configuration.
    pub fn from_config(config: &DevConfig) -> Self {
        Self {
            has_server: config.has_server,
            react_hot_loader: config.react_hot_loader,
            client_port: config.client_addr.port,
            server_port: config.server_addr.port,
            client_public_url: config.client_public_url.clone(),
            server_href: config.server_addr.href.clone(),
        }
    }
}

/// Session state machine.
#[derive(Debug)]
pub struct DevSession {
    plan: SessionPlan,
    client_mounted: Latch,
    client_announced: Latch,
    server_requested: Latch,
    server_spawned: Latch,
    server_announced: Latch,
}

impl DevSession {
    /// Create a session for `plan`.
    pub fn new(plan: SessionPlan) -> Self {
        Self {
            plan,
            client_mounted: Latch::new(),
            client_announced: Latch::new(),
            server_requested: Latch::new(),
            server_spawned: Latch::new(),
            server_announced: Latch::new(),
        }
    }

    /// The plan this session runs.
    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    /// Opening effects. `cleaned` tells whether a previous build directory
    /// was removed.
    pub fn begin(&mut self, cleaned: Option<String>) -> Vec<Effect> {
        let mut effects = vec![Effect::Report(Checkpoint::Starting)];

        if let Some(path) = cleaned {
            effects.push(Effect::Report(Checkpoint::Cleaned { path }));
        }
        if self.plan.has_server {
            effects.push(Effect::WatchServer);
        }
        effects.push(Effect::AwaitPort {
            target: PortTarget::Client,
            port: self.plan.client_port,
        });

        effects
    }

    /// Handle one event.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::PortFree(target) => self.on_port_free(target),
            SessionEvent::ClientCompiled(stats) => self.on_client_compile(&stats),
            SessionEvent::ServerCompiled(stats) => self.on_server_compile(&stats),
            SessionEvent::ClientSourceChanged(_) => vec![Effect::CompileClient],
            SessionEvent::ServerSourceChanged(change) => self.on_watched_source_change(&change),
            SessionEvent::Supervisor(event) => self.on_supervisor(event),
            SessionEvent::DevServerStopped { error } => vec![
                Effect::Report(Checkpoint::DevServerStopped {
                    error: error.clone(),
                }),
                Effect::Abort { reason: error },
            ],
        }
    }

    fn on_port_free(&mut self, target: PortTarget) -> Vec<Effect> {
        match target {
            PortTarget::Client if self.client_mounted.fire() => {
                vec![Effect::MountClient, Effect::WatchClient, Effect::CompileClient]
            }
            PortTarget::Server if self.server_spawned.fire() => vec![Effect::StartServer],
            _ => Vec::new(),
        }
    }

    /// A failed pass does nothing; the previous build keeps serving.
    pub fn on_client_compile(&mut self, stats: &CompileStats) -> Vec<Effect> {
        if stats.has_errors() {
            return Vec::new();
        }

        let mut effects = vec![Effect::PublishClient {
            duration: stats.duration,
        }];

        if self.client_announced.fire() {
            if self.plan.react_hot_loader {
                effects.push(Effect::Report(Checkpoint::HotLoaderReady));
            }
            let url = self.plan.client_public_url.clone();
            effects.push(Effect::Report(if self.plan.has_server {
                Checkpoint::ClientAssets { url }
            } else {
                Checkpoint::StartingUp { url }
            }));
        }

        if self.plan.has_server {
            effects.push(Effect::CompileServer);
        } else {
            effects.push(Effect::Report(Checkpoint::ClientStarted));
        }

        effects
    }

    /// The first good pass waits for the server port, later ones restart.
    pub fn on_server_compile(&mut self, stats: &CompileStats) -> Vec<Effect> {
        if stats.has_errors() || !self.plan.has_server {
            return Vec::new();
        }

        if self.server_requested.fire() {
            vec![Effect::AwaitPort {
                target: PortTarget::Server,
                port: self.plan.server_port,
            }]
        } else {
            vec![Effect::RestartServer]
        }
    }

    /// Every change kind asks for exactly one server compile.
    pub fn on_watched_source_change(&mut self, change: &FileChange) -> Vec<Effect> {
        if !self.plan.has_server {
            return Vec::new();
        }
        tracing::debug!(kind = ?change.kind, path = %change.path.display(), "server source changed");
        vec![Effect::CompileServer]
    }

    fn on_supervisor(&mut self, event: SupervisorEvent) -> Vec<Effect> {
        match event {
            SupervisorEvent::Started if self.server_announced.fire() => vec![
                Effect::Report(Checkpoint::ServerRunning {
                    href: self.plan.server_href.clone(),
                }),
                Effect::Report(Checkpoint::DevelopmentStarted),
            ],
            SupervisorEvent::Started => Vec::new(),
            SupervisorEvent::Restarted => vec![Effect::Report(Checkpoint::ServerRestarted)],
            SupervisorEvent::Quit { code } => vec![
                Effect::Report(Checkpoint::ServerQuit { code }),
                Effect::Shutdown { code },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::watcher::ChangeKind;

    const PASS_TIME: Duration = Duration::from_millis(10);

    fn plan(has_server: bool, react_hot_loader: bool) -> SessionPlan {
        SessionPlan {
            has_server,
            react_hot_loader,
            client_port: 3001,
            server_port: 3000,
            client_public_url: "http://localhost:3001/".to_string(),
            server_href: "http://localhost:3000/".to_string(),
        }
    }

    fn ok(pass: u64) -> CompileStats {
        CompileStats::success(pass, PASS_TIME)
    }

    fn failed(pass: u64) -> CompileStats {
        CompileStats::failure(pass, PASS_TIME, "syntax error")
    }

    fn count(effects: &[Effect], wanted: &Effect) -> usize {
        effects.iter().filter(|effect| *effect == wanted).count()
    }

    fn reports(effects: &[Effect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Report(checkpoint) => Some(checkpoint.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_latch_fires_once() {
        let mut latch = Latch::new();
        assert!(!latch.is_fired());
        assert!(latch.fire());
        assert!(!latch.fire());
        assert!(!latch.fire());
        assert!(latch.is_fired());
    }

    #[test]
    fn test_begin_waits_for_client_port() {
        let mut session = DevSession::new(plan(true, false));
        let effects = session.begin(None);

        assert_eq!(
            effects,
            vec![
                Effect::Report(Checkpoint::Starting),
                Effect::WatchServer,
                Effect::AwaitPort {
                    target: PortTarget::Client,
                    port: 3001
                },
            ]
        );
    }

    #[test]
    fn test_begin_reports_cleaned_directory() {
        let mut session = DevSession::new(plan(false, false));
        let effects = session.begin(Some("./build".to_string()));

        assert_eq!(
            reports(&effects),
            vec!["Starting development build...", "Cleaned ./build"]
        );
        assert!(!effects.contains(&Effect::WatchServer));
    }

    #[test]
    fn test_client_is_mounted_once() {
        let mut session = DevSession::new(plan(true, false));

        let first = session.handle(SessionEvent::PortFree(PortTarget::Client));
        assert_eq!(
            first,
            vec![Effect::MountClient, Effect::WatchClient, Effect::CompileClient]
        );

        let second = session.handle(SessionEvent::PortFree(PortTarget::Client));
        assert!(second.is_empty());
    }

    #[test]
    fn test_client_ready_is_announced_once() {
        let mut session = DevSession::new(plan(true, true));

        let mut all = Vec::new();
        for pass in 1..=5 {
            all.extend(session.on_client_compile(&ok(pass)));
        }

        assert_eq!(count(&all, &Effect::Report(Checkpoint::HotLoaderReady)), 1);
        assert_eq!(
            count(
                &all,
                &Effect::Report(Checkpoint::ClientAssets {
                    url: "http://localhost:3001/".to_string()
                })
            ),
            1
        );
        assert_eq!(
            count(&all, &Effect::PublishClient { duration: PASS_TIME }),
            5
        );
        assert_eq!(count(&all, &Effect::CompileServer), 5);
    }

    #[test]
    fn test_server_starts_once_and_restarts_after() {
        let mut session = DevSession::new(plan(true, false));

        let mut all = Vec::new();
        for pass in 1..=4 {
            all.extend(session.on_server_compile(&ok(pass)));
            // The port comes free every time it is asked about
            if all.iter().any(|e| matches!(e, Effect::AwaitPort { .. })) {
                all.extend(session.handle(SessionEvent::PortFree(PortTarget::Server)));
            }
        }

        assert_eq!(count(&all, &Effect::StartServer), 1);
        assert_eq!(count(&all, &Effect::RestartServer), 3);
        assert_eq!(
            count(
                &all,
                &Effect::AwaitPort {
                    target: PortTarget::Server,
                    port: 3000
                }
            ),
            1
        );
    }

    #[test]
    fn test_failed_compiles_do_nothing() {
        let mut session = DevSession::new(plan(true, true));

        assert!(session.on_client_compile(&failed(1)).is_empty());
        assert!(session.on_server_compile(&failed(1)).is_empty());

        // A failure does not consume the latches
        let effects = session.on_client_compile(&ok(2));
        assert!(effects.contains(&Effect::Report(Checkpoint::HotLoaderReady)));
        let effects = session.on_server_compile(&ok(2));
        assert!(matches!(effects[..], [Effect::AwaitPort { .. }]));
    }

    #[test]
    fn test_failed_compile_between_good_ones_does_not_restart() {
        let mut session = DevSession::new(plan(true, false));
        session.on_server_compile(&ok(1));
        session.handle(SessionEvent::PortFree(PortTarget::Server));

        assert!(session.on_server_compile(&failed(2)).is_empty());
        assert_eq!(session.on_server_compile(&ok(3)), vec![Effect::RestartServer]);
    }

    #[test]
    fn test_client_only_session() {
        let mut session = DevSession::new(plan(false, false));

        assert!(!session.begin(None).contains(&Effect::WatchServer));

        let effects = session.on_client_compile(&ok(1));
        assert_eq!(
            effects,
            vec![
                Effect::PublishClient {
                    duration: PASS_TIME
                },
                Effect::Report(Checkpoint::StartingUp {
                    url: "http://localhost:3001/".to_string()
                }),
                Effect::Report(Checkpoint::ClientStarted),
            ]
        );
        assert!(!effects.contains(&Effect::CompileServer));

        let change = FileChange::new(ChangeKind::Change, "/project/src/server/index.js");
        assert!(session.on_watched_source_change(&change).is_empty());
        assert!(session.on_server_compile(&ok(1)).is_empty());
    }

    #[test]
    fn test_every_change_kind_requests_one_server_compile() {
        let mut session = DevSession::new(plan(true, false));

        for kind in ChangeKind::ALL {
            let change = FileChange::new(kind, "/project/src/server/routes");
            let effects = session.handle(SessionEvent::ServerSourceChanged(change));
            assert_eq!(effects, vec![Effect::CompileServer], "{:?}", kind);
        }
    }

    #[test]
    fn test_client_source_change_recompiles_client() {
        let mut session = DevSession::new(plan(true, false));
        let change = FileChange::new(ChangeKind::AddFile, "/project/src/client/new.js");

        assert_eq!(
            session.handle(SessionEvent::ClientSourceChanged(change)),
            vec![Effect::CompileClient]
        );
    }

    #[test]
    fn test_server_start_waits_for_port() {
        let mut session = DevSession::new(plan(true, false));

        let effects = session.on_server_compile(&ok(1));
        assert_eq!(
            effects,
            vec![Effect::AwaitPort {
                target: PortTarget::Server,
                port: 3000
            }]
        );
        assert!(!effects.contains(&Effect::StartServer));

        assert_eq!(
            session.handle(SessionEvent::PortFree(PortTarget::Server)),
            vec![Effect::StartServer]
        );
        assert!(session
            .handle(SessionEvent::PortFree(PortTarget::Server))
            .is_empty());
    }

    #[test]
    fn test_server_announced_once() {
        let mut session = DevSession::new(plan(true, false));

        let first = session.handle(SessionEvent::Supervisor(SupervisorEvent::Started));
        assert_eq!(
            reports(&first),
            vec!["Server running at: http://localhost:3000/", "Development started"]
        );

        let again = session.handle(SessionEvent::Supervisor(SupervisorEvent::Started));
        assert!(again.is_empty());

        let restarted = session.handle(SessionEvent::Supervisor(SupervisorEvent::Restarted));
        assert_eq!(reports(&restarted), vec!["Development server restarted"]);
    }

    #[test]
    fn test_server_quit_ends_session() {
        let mut session = DevSession::new(plan(true, false));
        let effects = session.handle(SessionEvent::Supervisor(SupervisorEvent::Quit { code: 2 }));

        assert_eq!(effects.last(), Some(&Effect::Shutdown { code: 2 }));
        assert_eq!(
            effects[0],
            Effect::Report(Checkpoint::ServerQuit { code: 2 })
        );
    }

    #[test]
    fn test_dev_server_stop_aborts() {
        let mut session = DevSession::new(plan(true, false));
        let effects = session.handle(SessionEvent::DevServerStopped {
            error: "address in use".to_string(),
        });

        assert_eq!(
            effects.last(),
            Some(&Effect::Abort {
                reason: "address in use".to_string()
            })
        );
    }

    #[test]
    fn test_full_log_sequence() {
        let mut session = DevSession::new(plan(true, true));
        let mut log = Vec::new();

        log.extend(reports(&session.begin(None)));
        log.extend(reports(&session.handle(SessionEvent::PortFree(PortTarget::Client))));
        log.extend(reports(&session.handle(SessionEvent::ClientCompiled(ok(1)))));
        log.extend(reports(&session.handle(SessionEvent::ServerCompiled(ok(1)))));
        log.extend(reports(&session.handle(SessionEvent::PortFree(PortTarget::Server))));
        log.extend(reports(
            &session.handle(SessionEvent::Supervisor(SupervisorEvent::Started)),
        ));

        assert_eq!(
            log,
            vec![
                "Starting development build...",
                "Setup React Hot Loader",
                "Client assets serving from http://localhost:3001/",
                "Server running at: http://localhost:3000/",
                "Development started",
            ]
        );

        let second = session.handle(SessionEvent::ServerCompiled(ok(2)));
        assert_eq!(second, vec![Effect::RestartServer]);
        assert_eq!(
            reports(&session.handle(SessionEvent::Supervisor(SupervisorEvent::Restarted))),
            vec!["Development server restarted"]
        );
    }

    #[test]
    fn test_checkpoint_levels() {
        assert_eq!(Checkpoint::Starting.level(), Level::Start);
        assert_eq!(Checkpoint::HotLoaderReady.level(), Level::Task);
        assert_eq!(Checkpoint::DevelopmentStarted.level(), Level::End);
        assert_eq!(Checkpoint::ClientStarted.level(), Level::End);
        assert_eq!(Checkpoint::ServerQuit { code: 1 }.level(), Level::Warn);
    }
}
