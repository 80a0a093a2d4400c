//! File system watcher for development mode.
//!
//! Watches one or more directory trees recursively and reports each change as
//! one of five kinds: file added, directory added, file changed, file removed,
//! directory removed. An optional per-path debounce window collapses bursts
//! from editors that write a file several times in a row.

use crate::error::{CliError, Result};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Kind of file system change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A file was created
    AddFile,
    /// A directory was created
    AddDir,
    /// A file's contents changed
    Change,
    /// A file was removed
    RemoveFile,
    /// A directory was removed
    RemoveDir,
}

impl ChangeKind {
    /// Every kind, in a stable order.
    pub const ALL: [ChangeKind; 5] = [
        ChangeKind::AddFile,
        ChangeKind::AddDir,
        ChangeKind::Change,
        ChangeKind::RemoveFile,
        ChangeKind::RemoveDir,
    ];
}

/// A single change under a watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// What happened
    pub kind: ChangeKind,
    /// Affected path
    pub path: PathBuf,
}

impl FileChange {
    /// Create a change event.
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Drops repeats of the same (path, kind) inside the window.
///
/// Only entries still inside the window are remembered.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_seen: HashMap<(PathBuf, ChangeKind), Instant>,
}

impl Debouncer {
    /// A zero window admits every event.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Whether an event seen at `now` should be reported.
    pub fn admit(&mut self, path: &Path, kind: ChangeKind, now: Instant) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let window = self.window;
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);

        let key = (path.to_path_buf(), kind);
        if self.last_seen.contains_key(&key) {
            return false;
        }
        self.last_seen.insert(key, now);
        true
    }

    /// Number of remembered events.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

/// File watcher with filtering and optional debouncing.
///
/// Changes are delivered through the channel returned by [`FileWatcher::new`].
/// Dropping the watcher stops delivery.
pub struct FileWatcher {
    /// Underlying notify watcher
    _watcher: RecommendedWatcher,
    /// Directories being watched
    roots: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher.
    ///
    /// # Arguments
    ///
    /// * `roots` - Directories to watch recursively
    /// * `ignore_patterns` - Patterns to ignore ("node_modules", "*.log")
    /// * `debounce` - Per-path debounce window; `Duration::ZERO` reports every event
    ///
    /// # Errors
    ///
    /// Returns error if a root doesn't exist or the watcher can't be created
    pub fn new(
        roots: Vec<PathBuf>,
        ignore_patterns: Vec<String>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if let Some(missing) = roots.iter().find(|root| !root.exists()) {
            return Err(CliError::FileNotFound(missing.clone()));
        }

        let (tx, rx) = mpsc::channel(256);

        let roots_clone = roots.clone();
        let mut debouncer = Debouncer::new(debounce);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("watch error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if Self::should_ignore(path, &roots_clone, &ignore_patterns) {
                    continue;
                }

                let Some(kind) = classify(&event.kind, path) else {
                    continue;
                };

                if !debouncer.admit(path, kind, Instant::now()) {
                    continue;
                }

                tracing::trace!(?kind, path = %path.display(), "file change");

                // notify calls back on its own thread, outside the runtime
                if tx.blocking_send(FileChange::new(kind, path.clone())).is_err() {
                    return;
                }
            }
        })?;

        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }

        Ok((
            Self {
                _watcher: watcher,
                roots,
            },
            rx,
        ))
    }

    /// Check if a path should be ignored.
    ///
    /// Paths outside every root, hidden files and directories, and paths
    /// matching an ignore pattern are dropped.
    fn should_ignore(path: &Path, roots: &[PathBuf], ignore_patterns: &[String]) -> bool {
        let Some(rel_path) = roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
            return true;
        };

        let path_str = rel_path.to_string_lossy();

        for pattern in ignore_patterns {
            if let Some(ext) = pattern.strip_prefix('*') {
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if path_str.starts_with(pattern.as_str())
                || path_str.contains(&format!("/{}", pattern))
            {
                return true;
            }
        }

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }

    /// Directories being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Map a notify event kind onto a [`ChangeKind`].
///
/// Access and metadata-only events are dropped. When the backend can't tell
/// files from directories, the path is inspected; a removed path can't be, so
/// it counts as a file.
pub fn classify(kind: &EventKind, path: &Path) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(CreateKind::File) => Some(ChangeKind::AddFile),
        EventKind::Create(CreateKind::Folder) => Some(ChangeKind::AddDir),
        EventKind::Create(_) => Some(added(path)),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => {
            if path.exists() {
                Some(added(path))
            } else {
                Some(ChangeKind::RemoveFile)
            }
        }
        EventKind::Modify(_) => (!path.is_dir()).then_some(ChangeKind::Change),
        EventKind::Remove(RemoveKind::Folder) => Some(ChangeKind::RemoveDir),
        EventKind::Remove(_) => Some(ChangeKind::RemoveFile),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn added(path: &Path) -> ChangeKind {
    if path.is_dir() {
        ChangeKind::AddDir
    } else {
        ChangeKind::AddFile
    }
}
