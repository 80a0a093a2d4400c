//! Compilers driven by the dev session.
//!
//! A compiler is anything that can run one build pass and say whether it
//! produced errors. [`CommandCompiler`] shells out to the project's own
//! bundler; the session never looks at what the bundler does, only at the
//! pass/fail outcome and where the output landed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;

/// Resolved output metadata of a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Output directory
    pub path: PathBuf,
    /// URL prefix the output is served under
    pub public_path: String,
    /// Entry module name
    pub entry: String,
}

impl OutputOptions {
    /// Path of the built entry script.
    ///
    /// `<path>/<entry>.js`, unless `entry` already carries an extension.
    pub fn script_path(&self) -> PathBuf {
        if Path::new(&self.entry).extension().is_some() {
            self.path.join(&self.entry)
        } else {
            self.path.join(format!("{}.js", self.entry))
        }
    }
}

/// Outcome of one compile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStats {
    /// Monotonic pass number for this compiler, starting at 1
    pub pass: u64,
    /// Wall-clock time the pass took
    pub duration: Duration,
    /// Error summaries; empty on success
    pub errors: Vec<String>,
}

impl CompileStats {
    /// A pass without errors.
    pub fn success(pass: u64, duration: Duration) -> Self {
        Self {
            pass,
            duration,
            errors: Vec::new(),
        }
    }

    /// A pass that reported an error.
    pub fn failure(pass: u64, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            pass,
            duration,
            errors: vec![error.into()],
        }
    }

    /// Whether the pass reported any error.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A compiler the session can trigger.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Where the compiler writes its output.
    fn output(&self) -> &OutputOptions;

    /// Run one compile pass.
    ///
    /// Never fails: errors are reported through [`CompileStats::errors`].
    async fn run(&self) -> CompileStats;
}

/// Compiler that runs an external build command.
///
/// stdout and stderr are inherited so the bundler's own diagnostics reach the
/// terminal unchanged. Passes of the same compiler never overlap: a request
/// made while a pass is running waits for it to finish.
pub struct CommandCompiler {
    name: String,
    command: Vec<String>,
    cwd: PathBuf,
    output: OutputOptions,
    /// Serializes passes and counts them
    passes: Mutex<u64>,
}

impl CommandCompiler {
    /// Create a compiler for `command`, run from `cwd`.
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        cwd: PathBuf,
        output: OutputOptions,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            cwd,
            output,
            passes: Mutex::new(0),
        }
    }

    /// Build from a resolved compiler spec.
    pub fn from_spec(spec: &crate::dev::config::CompilerSpec, cwd: &Path) -> Self {
        Self::new(
            spec.name.clone(),
            spec.command.clone(),
            cwd.to_path_buf(),
            spec.output.clone(),
        )
    }

    async fn execute(&self) -> Result<(), String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| "empty build command".to_string())?;

        tracing::debug!(compiler = %self.name, program = %program, args = ?args, "running build command");

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| format!("failed to launch `{}`: {}", program, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(match status.code() {
                Some(code) => format!("`{}` exited with status {}", program, code),
                None => format!("`{}` was terminated by a signal", program),
            })
        }
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &OutputOptions {
        &self.output
    }

    async fn run(&self) -> CompileStats {
        let mut passes = self.passes.lock().await;
        *passes += 1;
        let pass = *passes;

        let started = Instant::now();
        let result = self.execute().await;
        let duration = started.elapsed();

        match result {
            Ok(()) => {
                tracing::debug!(compiler = %self.name, pass, ?duration, "compile pass succeeded");
                CompileStats::success(pass, duration)
            }
            Err(error) => {
                tracing::debug!(compiler = %self.name, pass, %error, "compile pass failed");
                CompileStats::failure(pass, duration, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output(dir: &Path) -> OutputOptions {
        OutputOptions {
            path: dir.join("build"),
            public_path: "/".to_string(),
            entry: "main".to_string(),
        }
    }

    #[test]
    fn test_script_path_appends_js() {
        let options = OutputOptions {
            path: PathBuf::from("/out"),
            public_path: "/".to_string(),
            entry: "main".to_string(),
        };
        assert_eq!(options.script_path(), PathBuf::from("/out/main.js"));
    }

    #[test]
    fn test_script_path_keeps_extension() {
        let options = OutputOptions {
            path: PathBuf::from("/out"),
            public_path: "/".to_string(),
            entry: "server.mjs".to_string(),
        };
        assert_eq!(options.script_path(), PathBuf::from("/out/server.mjs"));
    }

    #[test]
    fn test_compile_stats_flags() {
        assert!(!CompileStats::success(1, Duration::ZERO).has_errors());
        assert!(CompileStats::failure(1, Duration::ZERO, "boom").has_errors());
    }

    #[tokio::test]
    async fn test_missing_program_is_a_failed_pass() {
        let temp = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "client",
            vec!["tandem-definitely-not-a-real-program".to_string()],
            temp.path().to_path_buf(),
            output(temp.path()),
        );

        let stats = compiler.run().await;
        assert!(stats.has_errors());
        assert!(stats.errors[0].contains("failed to launch"));
    }

    #[tokio::test]
    async fn test_empty_command_is_a_failed_pass() {
        let temp = TempDir::new().unwrap();
        let compiler =
            CommandCompiler::new("server", vec![], temp.path().to_path_buf(), output(temp.path()));

        let stats = compiler.run().await;
        assert!(stats.has_errors());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_decides_outcome() {
        let temp = TempDir::new().unwrap();
        let ok = CommandCompiler::new(
            "client",
            vec!["true".to_string()],
            temp.path().to_path_buf(),
            output(temp.path()),
        );
        let bad = CommandCompiler::new(
            "client",
            vec!["false".to_string()],
            temp.path().to_path_buf(),
            output(temp.path()),
        );

        assert!(!ok.run().await.has_errors());
        assert!(bad.run().await.has_errors());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_passes_are_numbered() {
        let temp = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "client",
            vec!["true".to_string()],
            temp.path().to_path_buf(),
            output(temp.path()),
        );

        assert_eq!(compiler.run().await.pass, 1);
        assert_eq!(compiler.run().await.pass, 2);
    }
}
