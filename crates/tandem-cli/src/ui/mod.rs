//! Terminal output for progress lines and status messages.
//!
//! Everything here writes to stderr so that stdout stays free for
//! machine-readable output (`tandem check --schema`).
//!
//! # Examples
//!
//! ```no_run
//! use tandem_cli::ui;
//!
//! ui::init_colors_with(false);
//!
//! ui::start("Starting development build...");
//! ui::task("Cleaned ./build");
//! ui::end("Development started");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_size};
pub use messages::{end, error, info, start, success, task, warning};

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR environment variables, falls back to
/// terminal capability detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support based on environment.
///
/// `owo-colors` only emits escapes when told to, so `--no-color` and the
/// environment are folded into its global override here.
pub fn init_colors_with(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}
