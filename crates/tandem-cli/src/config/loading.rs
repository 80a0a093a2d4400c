use crate::config::TandemConfig;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "tandem.config.json";

/// Prefix for environment overrides (`TANDEM_HAS_SERVER=false`).
pub const ENV_PREFIX: &str = "TANDEM_";

/// Scalar fields that may be overridden from the environment, as
/// (variable suffix, field name on disk).
const ENV_KEYS: &[(&str, &str)] = &[
    ("client_url", "clientURL"),
    ("server_url", "serverURL"),
    ("react_hot_loader", "reactHotLoader"),
    ("has_server", "hasServer"),
    ("build_path", "buildPath"),
    ("server_src_path", "serverSrcPath"),
    ("debounce_ms", "debounceMs"),
];

/// Field name for an environment variable suffix (`has_server` -> `hasServer`).
pub(crate) fn env_field(suffix: &str) -> Option<&'static str> {
    ENV_KEYS
        .iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(suffix))
        .map(|(_, field)| *field)
}

/// Command-line overrides, applied after file and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replace the port of `clientURL`
    pub client_port: Option<u16>,
    /// Replace the port of `serverURL`
    pub server_port: Option<u16>,
    /// Force `hasServer: false`
    pub no_server: bool,
    /// Force `reactHotLoader: true`
    pub hot_loader: bool,
}

impl TandemConfig {
    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    ///
    /// A relative `config_path` is resolved against `cwd`. An explicit path
    /// that doesn't exist is an error; a missing default file is not.
    pub fn load(cwd: &Path, config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default_config()));

        if let Some(path) = Self::locate(cwd, config_path)? {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        // Renamed to the on-disk field names, which are case-sensitive
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .filter_map(|key| env_field(key.as_str()).map(Into::into))
                .lowercase(false),
        );

        figment
            .extract()
            .map_err(|e| ConfigError::from(e).into())
    }

    /// Find the config file to read, if any.
    pub fn locate(cwd: &Path, config_path: Option<&Path>) -> Result<Option<PathBuf>> {
        match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                };
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Ok(Some(path))
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE_NAME);
                Ok(default_path.is_file().then_some(default_path))
            }
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(port) = overrides.client_port {
            self.client_url
                .set_port(Some(port))
                .map_err(|_| ConfigError::InvalidValue {
                    field: "clientURL".to_string(),
                    value: self.client_url.to_string(),
                    hint: "This URL cannot carry a port".to_string(),
                })?;
        }
        if let Some(port) = overrides.server_port {
            self.server_url
                .set_port(Some(port))
                .map_err(|_| ConfigError::InvalidValue {
                    field: "serverURL".to_string(),
                    value: self.server_url.to_string(),
                    hint: "This URL cannot carry a port".to_string(),
                })?;
        }
        if overrides.no_server {
            self.has_server = false;
        }
        if overrides.hot_loader {
            self.react_hot_loader = true;
        }
        Ok(())
    }

    /// Get default configuration values.
    pub fn default_config() -> Self {
        use crate::config::{defaults::*, types::*};

        Self {
            client_url: default_client_url(),
            server_url: default_server_url(),
            react_hot_loader: false,
            has_server: default_has_server(),
            build_path: default_build_path(),
            server_src_path: default_server_src_path(),
            debounce_ms: default_debounce_ms(),
            watch_ignore: default_watch_ignore(),
            client: ClientBuild::default(),
            server: ServerBuild::default(),
        }
    }
}
