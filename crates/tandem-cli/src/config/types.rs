use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::defaults::*;

/// Client build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientBuild {
    /// Build command as an argument vector (e.g. ["npx", "webpack"])
    #[serde(default)]
    pub command: Vec<String>,

    /// Source directories whose changes trigger a client rebuild
    #[serde(default = "default_client_watch")]
    pub watch: Vec<PathBuf>,

    /// Directory the client build writes to
    #[serde(default = "default_client_output_path")]
    pub output_path: PathBuf,

    /// URL prefix the client build is served under
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Name of the client entry module
    #[serde(default = "default_entry")]
    pub entry: String,
}

impl Default for ClientBuild {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            watch: default_client_watch(),
            output_path: default_client_output_path(),
            public_path: default_public_path(),
            entry: default_entry(),
        }
    }
}

/// Server build and process settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerBuild {
    /// Build command as an argument vector
    #[serde(default)]
    pub command: Vec<String>,

    /// Directory the server build writes to
    #[serde(default = "default_server_output_path")]
    pub output_path: PathBuf,

    /// Entry module name; the script run is `<outputPath>/<entry>.js`
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Program that runs the built server script
    #[serde(default = "default_exec")]
    pub exec: String,

    /// Extra arguments passed to `exec` before the script path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Default for ServerBuild {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            output_path: default_server_output_path(),
            entry: default_entry(),
            exec: default_exec(),
            args: Vec::new(),
        }
    }
}
