//! Resolved development session configuration.
//!
//! Turns a loaded [`TandemConfig`] into the immutable, absolute-path form the
//! session runs on. Nothing here touches the network; port availability is
//! checked later, right before binding.

use crate::config::{validate_service_url, TandemConfig};
use crate::dev::compiler::OutputOptions;
use crate::error::{ConfigError, Result};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use url::Url;

/// A parsed listen address: hostname, port and the full origin string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddr {
    /// Hostname to bind (e.g. "localhost")
    pub hostname: String,
    /// TCP port
    pub port: u16,
    /// Full URL as configured (e.g. "http://localhost:3000/")
    pub href: String,
    /// Scheme, host and port (e.g. "http://localhost:3000")
    pub origin: String,
}

impl ServiceAddr {
    /// Build from a URL, checking it carries a host and a port.
    pub fn from_url(field: &str, url: &Url) -> Result<Self> {
        validate_service_url(field, url)?;

        let hostname = url.host_str().unwrap_or_default().to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: field.to_string(),
                value: url.to_string(),
                hint: "The URL needs a port".to_string(),
            })?;

        Ok(Self {
            hostname,
            port,
            href: url.to_string(),
            origin: url.origin().ascii_serialization(),
        })
    }
}

/// Settings for one compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSpec {
    /// Label used in logs ("client", "server")
    pub name: String,
    /// Build command argument vector
    pub command: Vec<String>,
    /// Resolved output metadata
    pub output: OutputOptions,
}

/// How the supervised server process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProcess {
    /// Program that runs the script
    pub exec: String,
    /// Arguments placed before the script path
    pub args: Vec<String>,
}

/// Development session configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Project root; commands run here and relative paths resolve here
    pub cwd: PathBuf,

    /// Client dev server address
    pub client_addr: ServiceAddr,

    /// Supervised server address
    pub server_addr: ServiceAddr,

    /// Public URL the client assets are served from
    pub client_public_url: String,

    /// Announce hot loader setup once the client is ready
    pub react_hot_loader: bool,

    /// Gates every server-side component
    pub has_server: bool,

    /// Build output directory, cleaned at session start
    pub build_path: PathBuf,

    /// Build output directory as configured, for log lines
    pub build_path_display: String,

    /// Server source tree to watch
    pub server_src_path: PathBuf,

    /// Client source directories to watch
    pub client_watch: Vec<PathBuf>,

    /// Client compiler settings
    pub client: CompilerSpec,

    /// Server compiler settings
    pub server: CompilerSpec,

    /// Supervised process launch settings
    pub server_process: ServerProcess,

    /// Patterns to ignore when watching files
    pub watch_ignore: Vec<String>,

    /// Debounce delay for client source changes
    pub debounce: Duration,
}

impl DevConfig {
    /// Resolve a validated configuration against the project root.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or an error if an address
    /// can't be turned into a bindable host/port pair.
    pub fn resolve(config: TandemConfig, cwd: PathBuf) -> Result<Self> {
        config.validate()?;

        let client_addr = ServiceAddr::from_url("clientURL", &config.client_url)?;
        let server_addr = ServiceAddr::from_url("serverURL", &config.server_url)?;

        let client_public_url = config
            .client_url
            .join(&config.client.public_path)
            .map_err(|e| ConfigError::InvalidValue {
                field: "client.publicPath".to_string(),
                value: config.client.public_path.clone(),
                hint: format!("Cannot be joined onto clientURL: {}", e),
            })?
            .to_string();

        let build_path = normalize(&resolve_path(&cwd, &config.build_path));
        if normalize(&cwd).starts_with(&build_path) {
            return Err(ConfigError::InvalidValue {
                field: "buildPath".to_string(),
                value: config.build_path.display().to_string(),
                hint: "The build directory is removed at startup and must not contain the project"
                    .to_string(),
            }
            .into());
        }

        let client = CompilerSpec {
            name: "client".to_string(),
            command: config.client.command.clone(),
            output: OutputOptions {
                path: resolve_path(&cwd, &config.client.output_path),
                public_path: config.client.public_path.clone(),
                entry: config.client.entry.clone(),
            },
        };

        let server = CompilerSpec {
            name: "server".to_string(),
            command: config.server.command.clone(),
            output: OutputOptions {
                path: resolve_path(&cwd, &config.server.output_path),
                public_path: "/".to_string(),
                entry: config.server.entry.clone(),
            },
        };

        Ok(Self {
            client_addr,
            server_addr,
            client_public_url,
            react_hot_loader: config.react_hot_loader,
            has_server: config.has_server,
            build_path,
            build_path_display: display_relative(&config.build_path),
            server_src_path: resolve_path(&cwd, &config.server_src_path),
            client_watch: config
                .client
                .watch
                .iter()
                .map(|p| resolve_path(&cwd, p))
                .collect(),
            client,
            server,
            server_process: ServerProcess {
                exec: config.server.exec.clone(),
                args: config.server.args.clone(),
            },
            watch_ignore: config.watch_ignore.clone(),
            debounce: Duration::from_millis(config.debounce_ms),
            cwd,
        })
    }

    /// Path of the script the supervisor runs.
    pub fn server_script(&self) -> PathBuf {
        self.server.output.script_path()
    }
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, matching how the OS resolves it.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !path.is_absolute() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Render a configured path the way log lines show it ("./build").
fn display_relative(path: &Path) -> String {
    if path.is_absolute() || path.starts_with(".") {
        path.display().to_string()
    } else {
        format!("./{}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TandemConfig {
        let mut config = TandemConfig::default_config();
        config.client.command = vec!["make".to_string(), "client".to_string()];
        config.server.command = vec!["make".to_string(), "server".to_string()];
        config
    }

    #[test]
    fn test_service_addr_from_url() {
        let url = Url::parse("http://localhost:3000").unwrap();
        let addr = ServiceAddr::from_url("serverURL", &url).unwrap();

        assert_eq!(addr.hostname, "localhost");
        assert_eq!(addr.port, 3000);
        assert_eq!(addr.href, "http://localhost:3000/");
        assert_eq!(addr.origin, "http://localhost:3000");
    }

    #[test]
    fn test_service_addr_default_port() {
        let url = Url::parse("https://dev.example.test/").unwrap();
        let addr = ServiceAddr::from_url("clientURL", &url).unwrap();
        assert_eq!(addr.port, 443);
    }

    #[test]
    fn test_resolve_makes_paths_absolute() {
        let cwd = PathBuf::from("/project");
        let dev = DevConfig::resolve(config(), cwd.clone()).unwrap();

        assert_eq!(dev.build_path, cwd.join("build"));
        assert_eq!(dev.build_path_display, "./build");
        assert_eq!(dev.server_src_path, cwd.join("src/server"));
        assert_eq!(dev.client_watch, vec![cwd.join("src/client")]);
        assert_eq!(dev.client.output.path, cwd.join("build/public"));
        assert_eq!(dev.server_script(), cwd.join("build/server/main.js"));
    }

    #[test]
    fn test_resolve_public_url() {
        let mut raw = config();
        raw.client.public_path = "/assets/".to_string();
        let dev = DevConfig::resolve(raw, PathBuf::from("/project")).unwrap();

        assert_eq!(dev.client_public_url, "http://localhost:3001/assets/");
    }

    #[test]
    fn test_resolve_rejects_invalid_config() {
        let mut raw = config();
        raw.client.command.clear();
        assert!(DevConfig::resolve(raw, PathBuf::from("/project")).is_err());
    }

    #[test]
    fn test_resolve_rejects_build_path_containing_project() {
        for path in [".", "/", "/project", "..", "build/..", "build/../..", "./build/./.."] {
            let mut raw = config();
            raw.build_path = PathBuf::from(path);
            assert!(
                DevConfig::resolve(raw, PathBuf::from("/project")).is_err(),
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_resolve_normalizes_build_path() {
        let mut raw = config();
        raw.build_path = PathBuf::from("./out/../build");
        let dev = DevConfig::resolve(raw, PathBuf::from("/project")).unwrap();
        assert_eq!(dev.build_path, PathBuf::from("/project/build"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/project/build/..")), PathBuf::from("/project"));
        assert_eq!(normalize(Path::new("/project/./a/../b")), PathBuf::from("/project/b"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn test_display_relative() {
        assert_eq!(display_relative(Path::new("build")), "./build");
        assert_eq!(display_relative(Path::new("./out")), "./out");
        assert_eq!(display_relative(Path::new("/tmp/out")), "/tmp/out");
    }
}
