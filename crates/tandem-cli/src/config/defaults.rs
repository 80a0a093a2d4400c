use std::path::PathBuf;
use url::Url;

pub fn default_client_url() -> Url {
    Url::parse("http://localhost:3001").expect("static client URL is valid")
}

pub fn default_server_url() -> Url {
    Url::parse("http://localhost:3000").expect("static server URL is valid")
}

pub fn default_has_server() -> bool {
    true
}

pub fn default_build_path() -> PathBuf {
    PathBuf::from("build")
}

pub fn default_server_src_path() -> PathBuf {
    PathBuf::from("src/server")
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_watch_ignore() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        "*.log".to_string(),
        ".DS_Store".to_string(),
    ]
}

pub fn default_client_watch() -> Vec<PathBuf> {
    vec![PathBuf::from("src/client")]
}

pub fn default_client_output_path() -> PathBuf {
    PathBuf::from("build/public")
}

pub fn default_server_output_path() -> PathBuf {
    PathBuf::from("build/server")
}

pub fn default_public_path() -> String {
    "/".to_string()
}

pub fn default_entry() -> String {
    "main".to_string()
}

pub fn default_exec() -> String {
    "node".to_string()
}
