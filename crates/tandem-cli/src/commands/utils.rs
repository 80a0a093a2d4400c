//! Shared utilities for command implementations.
//!
//! - Working directory resolution
//! - Configuration loading, overriding and resolution
//! - Build directory cleaning

use crate::config::{Overrides, TandemConfig};
use crate::dev::DevConfig;
use crate::error::{CliError, Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the current working directory.
///
/// # Errors
///
/// Returns I/O error if current directory cannot be determined.
pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Resolve the project directory from `--cwd`, defaulting to the process
/// working directory.
///
/// # Errors
///
/// Returns error if the directory doesn't exist or isn't a directory
pub fn resolve_cwd(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = get_cwd()?;
    let Some(cwd) = cwd else {
        return Ok(current);
    };

    let cwd = if cwd.is_absolute() {
        cwd.to_path_buf()
    } else {
        current.join(cwd)
    };

    if !cwd.exists() {
        return Err(CliError::FileNotFound(cwd));
    }
    if !cwd.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Working directory is not a directory: {}",
            cwd.display()
        )));
    }

    Ok(cwd)
}

/// Load, override and resolve the configuration for a project.
///
/// # Errors
///
/// Returns configuration errors from any layer, or validation failures
pub fn load_dev_config(
    cwd: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<DevConfig> {
    let mut config = TandemConfig::load(cwd, config_path)?;
    config.apply_overrides(overrides)?;
    DevConfig::resolve(config, cwd.to_path_buf())
}

/// Remove the build directory if it exists.
///
/// Returns `true` when something was removed.
///
/// # Errors
///
/// Returns error if the path is not a directory or removal fails
pub fn remove_build_dir(build_path: &Path) -> Result<bool> {
    if !build_path.exists() {
        return Ok(false);
    }

    if !build_path.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Build path exists but is not a directory: {}",
            build_path.display()
        )));
    }

    fs::remove_dir_all(build_path).with_hint(format!(
        "Could not clean {}; close anything holding files in it and retry",
        build_path.display()
    ))?;
    tracing::debug!(path = %build_path.display(), "removed build directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_remove_build_dir_missing() {
        let temp = TempDir::new().unwrap();
        assert!(!remove_build_dir(&temp.path().join("build")).unwrap());
    }

    #[test]
    fn test_remove_build_dir_recursive() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        fs::create_dir_all(build.join("public/js")).unwrap();
        fs::write(build.join("public/js/main.js"), "1").unwrap();

        assert!(remove_build_dir(&build).unwrap());
        assert!(!build.exists());
    }

    #[test]
    fn test_remove_build_dir_rejects_files() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        fs::write(&build, "not a dir").unwrap();

        assert!(matches!(
            remove_build_dir(&build),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(build.exists());
    }

    #[test]
    fn test_resolve_cwd_missing() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            resolve_cwd(Some(&missing)),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_cwd_absolute() {
        let temp = TempDir::new().unwrap();
        assert_eq!(resolve_cwd(Some(temp.path())).unwrap(), temp.path());
    }

    #[test]
    #[serial]
    fn test_load_dev_config_applies_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("tandem.config.json"),
            r#"{ "client": { "command": ["make", "client"] }, "server": { "command": ["make", "server"] } }"#,
        )
        .unwrap();

        let overrides = Overrides {
            client_port: Some(4001),
            no_server: true,
            ..Overrides::default()
        };
        let config = load_dev_config(temp.path(), None, &overrides).unwrap();

        assert_eq!(config.client_addr.port, 4001);
        assert!(!config.has_server);
    }
}
