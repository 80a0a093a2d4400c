//! Shared state for the client dev server.
//!
//! Holds the files of the latest good client build, the connected hot-reload
//! clients and the build counter, behind parking_lot locks so axum handlers
//! and the session driver can share one instance.

use crate::error::{Result, ResultExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Files larger than this are left on disk and served from there.
const MAX_CACHED_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Hot-reload events pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum HmrEvent {
    /// Sent to a client right after it connects
    Connected { id: usize },

    /// A new client build is being served
    Built { build: u64, duration_ms: u64 },
}

/// In-memory copy of the client build output.
///
/// Keys are URL paths (public path + file name), values are content and
/// content type.
#[derive(Debug, Clone, Default)]
pub struct BundleCache {
    files: HashMap<String, (Vec<u8>, String)>,
}

impl BundleCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Insert a file into the cache.
    ///
    /// # Arguments
    ///
    /// * `path` - URL path (e.g., "/main.js")
    /// * `content` - File content as bytes
    /// * `content_type` - MIME type (e.g., "application/javascript")
    pub fn insert(&mut self, path: String, content: Vec<u8>, content_type: String) {
        self.files.insert(path, (content, content_type));
    }

    /// Get a file from the cache.
    pub fn get(&self, path: &str) -> Option<&(Vec<u8>, String)> {
        self.files.get(path)
    }

    /// Clear all cached files.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Get number of cached files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Client connection tracker for Server-Sent Events.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, tokio::sync::mpsc::Sender<String>>>>;

/// Shared dev server state.
pub struct DevServerState {
    /// Latest good client build
    pub cache: RwLock<BundleCache>,

    /// Connected SSE clients
    pub clients: ClientRegistry,

    /// Next client ID
    pub next_client_id: RwLock<usize>,

    /// Number of builds published so far
    builds: RwLock<u64>,

    /// Client build output directory
    out_dir: PathBuf,

    /// URL prefix the build is served under, always ending in '/'
    public_path: String,
}

impl DevServerState {
    /// Create state for a client build written to `out_dir` and served
    /// under `public_path`.
    pub fn new(out_dir: PathBuf, public_path: &str) -> Self {
        Self {
            cache: RwLock::new(BundleCache::new()),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
            builds: RwLock::new(0),
            out_dir,
            public_path: normalize_public_path(public_path),
        }
    }

    /// Client build output directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// URL prefix the build is served under.
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// URL path of a build file.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}{}", self.public_path, file_name.trim_start_matches('/'))
    }

    /// Number of builds published so far.
    pub fn build_count(&self) -> u64 {
        *self.builds.read()
    }

    /// Whether a good build has been published yet.
    pub fn has_build(&self) -> bool {
        self.build_count() > 0
    }

    /// Replace the bundle cache.
    pub fn update_cache(&self, new_cache: BundleCache) {
        *self.cache.write() = new_cache;
    }

    /// Get a file from the cache.
    pub fn get_cached_file(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.cache.read().get(path).cloned()
    }

    /// Load the top-level files of the output directory into a fresh cache.
    ///
    /// Nested files and files over 10 MiB stay on disk. Returns the number of
    /// cached files.
    ///
    /// # Errors
    ///
    /// Returns error if the output directory can't be read
    pub async fn reload_from_disk(&self) -> Result<usize> {
        let mut cache = BundleCache::new();
        let mut total_bytes = 0;
        let mut entries = tokio::fs::read_dir(&self.out_dir)
            .await
            .with_path(&self.out_dir)?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() || metadata.len() > MAX_CACHED_FILE_SIZE {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let content = tokio::fs::read(entry.path()).await?;
            total_bytes += content.len() as u64;
            cache.insert(
                self.url_for(&name),
                content,
                content_type_for(&name).to_string(),
            );
        }

        let count = cache.len();
        self.update_cache(cache);
        tracing::debug!(
            files = count,
            size = %crate::ui::format_size(total_bytes),
            dir = %self.out_dir.display(),
            "client build cached"
        );
        Ok(count)
    }

    /// Serve a freshly compiled client build and notify connected browsers.
    ///
    /// # Errors
    ///
    /// Returns error if the output directory can't be read; the previous
    /// build keeps serving in that case.
    pub async fn publish(&self, duration: Duration) -> Result<HmrEvent> {
        self.reload_from_disk().await?;

        let build = {
            let mut builds = self.builds.write();
            *builds += 1;
            *builds
        };

        let event = HmrEvent::Built {
            build,
            duration_ms: duration.as_millis() as u64,
        };
        self.broadcast(&event).await;
        Ok(event)
    }

    /// Register a new SSE client.
    ///
    /// # Returns
    ///
    /// Client ID and receiver for events
    pub fn register_client(&self) -> (usize, tokio::sync::mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = tokio::sync::mpsc::channel(100);
        self.clients.write().insert(id, tx);

        (id, rx)
    }

    /// Unregister an SSE client.
    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Broadcast an event to all connected clients.
    ///
    /// Clients whose channel is closed are dropped from the registry.
    pub async fn broadcast(&self, event: &HmrEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());

        // Snapshot so the lock isn't held across await points
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }

        for id in failed_ids {
            self.unregister_client(id);
        }
    }

    /// Get number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;

fn normalize_public_path(public_path: &str) -> String {
    let trimmed = public_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Determine content type from file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "wasm" => "application/wasm",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
