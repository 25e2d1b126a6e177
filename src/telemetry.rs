//! Telemetry utilities for event timing and log setup.

use crate::config::LogFormat;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Guard for timing event handling and recording metrics.
///
/// Records event latency when dropped.
pub struct EventTimer {
    event: &'static str,
    start: Instant,
}

impl EventTimer {
    /// Start timing an event.
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            start: Instant::now(),
        }
    }
}

impl Drop for EventTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_event(self.event, duration);
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. Returns an error if a
/// subscriber is already installed.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?,
        LogFormat::Pretty => builder.try_init().map_err(|e| anyhow::anyhow!(e))?,
    }
    Ok(())
}

/// Standardized span constructors for relay observability.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, field, info_span};
    use uuid::Uuid;

    /// Create a span for a client session. `user_id` is recorded on join.
    pub fn connection(session_id: Uuid, addr: SocketAddr) -> Span {
        info_span!(
            "connection",
            session_id = %session_id,
            addr = %addr,
            user_id = field::Empty
        )
    }
}
