//! Prometheus metrics collection for chirp-relay.
//!
//! Exposed on the side HTTP server at `/metrics`. Every helper is a no-op
//! until [`init`] has run, so library users and tests that never call it
//! pay nothing.
//!
//! ## Relay Metrics
//!
//! - `chirp_connected_sessions` - Open WebSocket sessions (gauge)
//! - `chirp_online_users` - Users with at least one bound session (gauge)
//! - `chirp_events_total{event}` - Client events processed by type
//! - `chirp_event_duration_seconds{event}` - Event handling latency
//! - `chirp_event_errors_total{event,error}` - Dropped events by error code
//! - `chirp_messages_relayed_total` - Message copies queued for delivery
//! - `chirp_messages_dropped_total{reason}` - Copies that were not delivered
//! - `chirp_message_fanout` - Receiver sessions per message (histogram)

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Message copies placed on a receiver session's outbound queue.
pub static MESSAGES_RELAYED: OnceLock<IntCounter> = OnceLock::new();

/// Message copies not delivered, by reason.
pub static MESSAGES_DROPPED: OnceLock<IntCounterVec> = OnceLock::new();

/// Client events processed by type.
pub static EVENT_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Client events dropped with an error, by type and error code.
pub static EVENT_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently open sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Users with at least one bound session.
pub static ONLINE_USERS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Event handling latency by event type.
pub static EVENT_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Message fan-out histogram: how many receiver sessions per message.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(MESSAGES_RELAYED, IntCounter::new("chirp_messages_relayed_total", "Message copies queued for delivery"));
    register!(MESSAGES_DROPPED, IntCounterVec::new(Opts::new("chirp_messages_dropped_total", "Message copies not delivered"), &["reason"]));
    register!(EVENT_COUNTER, IntCounterVec::new(Opts::new("chirp_events_total", "Client events processed by type"), &["event"]));
    register!(EVENT_ERRORS, IntCounterVec::new(Opts::new("chirp_event_errors_total", "Client events dropped with an error"), &["event", "error"]));
    register!(CONNECTED_SESSIONS, IntGauge::new("chirp_connected_sessions", "Currently open sessions"));
    register!(ONLINE_USERS, IntGauge::new("chirp_online_users", "Users with at least one bound session"));
    register!(EVENT_LATENCY, HistogramVec::new(
        HistogramOpts::new("chirp_event_duration_seconds", "Client event latency by type")
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["event"]));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("chirp_message_fanout", "Receiver sessions per message")
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0, 25.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for relay metric updates
// ============================================================================

/// Record a processed client event with latency.
#[inline]
pub fn record_event(event: &str, duration_secs: f64) {
    if let Some(c) = EVENT_COUNTER.get() {
        c.with_label_values(&[event]).inc();
    }
    if let Some(h) = EVENT_LATENCY.get() {
        h.with_label_values(&[event]).observe(duration_secs);
    }
}

/// Record a dropped client event.
#[inline]
pub fn record_event_error(event: &str, error: &str) {
    if let Some(c) = EVENT_ERRORS.get() {
        c.with_label_values(&[event, error]).inc();
    }
}

/// Record the outcome of one relayed message.
#[inline]
pub fn record_delivery(queued: usize, fanout: usize) {
    if let Some(c) = MESSAGES_RELAYED.get() {
        c.inc_by(queued as u64);
    }
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(fanout as f64);
    }
}

/// Record `count` message copies dropped for `reason`.
#[inline]
pub fn record_dropped(reason: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(c) = MESSAGES_DROPPED.get() {
        c.with_label_values(&[reason]).inc_by(count as u64);
    }
}

/// Update the session and presence gauges.
#[inline]
pub fn set_presence(sessions: usize, online_users: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(sessions as i64);
    }
    if let Some(g) = ONLINE_USERS.get() {
        g.set(online_users as i64);
    }
}
