//! Status message functions for terminal output.
//!
//! `start`, `task` and `end` mark the checkpoints of a dev session; the other
//! helpers are for one-off status lines.

use owo_colors::{OwoColorize, Stream::Stderr};

/// Print the opening line of a long-running operation.
pub fn start(message: &str) {
    eprintln!(
        "\n{} {}",
        "▶".if_supports_color(Stderr, |t| t.cyan()),
        message.if_supports_color(Stderr, |t| t.bold())
    );
}

/// Print an intermediate checkpoint.
pub fn task(message: &str) {
    eprintln!("{} {}", "›".if_supports_color(Stderr, |t| t.cyan()), message);
}

/// Print the line that marks an operation as up and running.
pub fn end(message: &str) {
    eprintln!(
        "{} {}\n",
        "✓".if_supports_color(Stderr, |t| t.green()),
        message.if_supports_color(Stderr, |t| t.green())
    );
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".if_supports_color(Stderr, |t| t.green()), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".if_supports_color(Stderr, |t| t.blue()), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        "⚠".if_supports_color(Stderr, |t| t.yellow()),
        message.if_supports_color(Stderr, |t| t.yellow())
    );
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        "✗".if_supports_color(Stderr, |t| t.red()),
        message.if_supports_color(Stderr, |t| t.red())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        start("Start message");
        task("Task message");
        end("End message");
        success("Success message");
        info("Info message");
        warning("Warning message");
        error("Error message");
    }
}
