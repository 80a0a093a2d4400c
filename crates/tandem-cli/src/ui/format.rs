//! Human-readable sizes and build times for log lines.

use std::time::Duration;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;

/// Size of a cached client build.
///
/// Builds are small, so anything past a few MiB is shown in MiB.
///
/// ```
/// use tandem_cli::ui::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 KiB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
/// ```
pub fn format_size(bytes: u64) -> String {
    match bytes {
        b if b < KIB => format!("{} B", b),
        b if b < MIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{:.1} MiB", b as f64 / MIB as f64),
    }
}

/// Duration of a compile pass.
///
/// ```
/// use std::time::Duration;
/// use tandem_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(240)), "240ms");
/// assert_eq!(format_duration(Duration::from_millis(2350)), "2.4s");
/// assert_eq!(format_duration(Duration::from_secs(75)), "1m15s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        return format!("{}m{}s", secs / 60, secs % 60);
    }

    match duration.as_millis() {
        ms if ms < 1000 => format!("{}ms", ms),
        _ => format!("{:.1}s", duration.as_secs_f64()),
    }
}
