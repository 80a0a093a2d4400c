//! Configuration system for Tandem with multi-source loading.
//!
//! Merges settings from the config file, environment variables and CLI flags.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod types;
mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub use defaults::*;
pub use loading::{Overrides, CONFIG_FILE_NAME, ENV_PREFIX};
pub use types::*;
pub use validation::*;

/// Tandem configuration - loaded from tandem.config.json, `TANDEM_*` and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TandemConfig {
    /// Address the client dev server listens on (e.g. "http://localhost:3001")
    #[serde(rename = "clientURL", default = "default_client_url")]
    #[schemars(with = "String")]
    pub client_url: Url,

    /// Address the supervised server listens on (e.g. "http://localhost:3000")
    #[serde(rename = "serverURL", default = "default_server_url")]
    #[schemars(with = "String")]
    pub server_url: Url,

    /// Announce hot module loader setup once the client is ready
    #[serde(default)]
    pub react_hot_loader: bool,

    /// Build, watch and supervise a server alongside the client
    #[serde(default = "default_has_server")]
    pub has_server: bool,

    /// Build output directory, removed at the start of every session
    #[serde(default = "default_build_path")]
    pub build_path: PathBuf,

    /// Server source tree; any change under it triggers a server recompile
    #[serde(default = "default_server_src_path")]
    pub server_src_path: PathBuf,

    /// Debounce window for client source changes, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Patterns ignored by the watchers ("node_modules", "*.log", ...)
    #[serde(default = "default_watch_ignore")]
    pub watch_ignore: Vec<String>,

    /// Client build settings
    #[serde(default)]
    pub client: ClientBuild,

    /// Server build and process settings
    #[serde(default)]
    pub server: ServerBuild,
}

impl TandemConfig {
    /// Generate JSON Schema for tandem.config.json.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(TandemConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }

    /// Generate example tandem.config.json content.
    pub fn example_config() -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self {
            react_hot_loader: true,
            client: ClientBuild {
                command: vec![
                    "npx".to_string(),
                    "webpack".to_string(),
                    "--config".to_string(),
                    "webpack.client.js".to_string(),
                ],
                public_path: "/assets/".to_string(),
                ..ClientBuild::default()
            },
            server: ServerBuild {
                command: vec![
                    "npx".to_string(),
                    "webpack".to_string(),
                    "--config".to_string(),
                    "webpack.server.js".to_string(),
                ],
                ..ServerBuild::default()
            },
            ..Self::default_config()
        })
    }
}
