//! Port availability gate.
//!
//! Listeners are only bound, and the server process only started, once the
//! target port is free. An occupied port is not an error: the gate polls
//! until whoever holds it lets go.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::net::TcpListener;

/// Default delay between two probes of an occupied port.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Answers "can something bind `host:port` right now?".
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Check whether the port is free.
    async fn is_free(&self, host: &str, port: u16) -> bool;
}

/// Probe that tries to bind the port and releases it immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl PortProbe for TcpProbe {
    async fn is_free(&self, host: &str, port: u16) -> bool {
        match TcpListener::bind((host, port)).await {
            Ok(_listener) => true,
            Err(e) if e.kind() == ErrorKind::AddrInUse => false,
            Err(e) => {
                // Anything else (unresolvable host, permissions) is left for
                // the real bind to report
                tracing::debug!(host, port, error = %e, "port probe inconclusive");
                true
            }
        }
    }
}

/// Wait until `host:port` is free.
///
/// Prints a warning the first time the port is seen occupied, then polls
/// every `interval`. Returns the number of occupied probes seen before the
/// port came free (zero when it was free straight away).
pub async fn wait_until_free(
    probe: &dyn PortProbe,
    host: &str,
    port: u16,
    interval: Duration,
) -> u32 {
    let mut occupied = 0;

    while !probe.is_free(host, port).await {
        if occupied == 0 {
            crate::ui::warning(&format!(
                "Port {} is in use, waiting for it to become free...",
                port
            ));
        }
        occupied += 1;
        tracing::trace!(host, port, attempt = occupied, "port still occupied");
        tokio::time::sleep(interval).await;
    }

    if occupied > 0 {
        tracing::debug!(host, port, attempts = occupied, "port became free");
    }

    occupied
}
