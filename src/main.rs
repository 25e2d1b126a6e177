//! chirpd - Chirp real-time relay daemon.

use chirp_relay::config::{self, Config};
use chirp_relay::{Gateway, Hub, http, metrics, telemetry};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default Prometheus port when `server.metrics_port` is unset.
const DEFAULT_METRICS_PORT: u16 = 9090;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the file, so this one goes to stderr.
            eprintln!("Failed to load config {config_path}: {e}");
            return Err(e.into());
        }
    };

    telemetry::init_logging(config.server.log_format)?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        server = %config.server.name,
        address = %config.listen.address,
        auth = ?config.auth.mode,
        "Starting chirpd"
    );

    let hub = Arc::new(Hub::new(&config)?);

    // Metrics
    metrics::init();
    match config.server.metrics_port.unwrap_or(DEFAULT_METRICS_PORT) {
        0 => info!("Metrics HTTP server disabled"),
        port => {
            tokio::spawn(http::run_http_server(port, Arc::clone(&hub)));
        }
    }

    let gateway = Gateway::bind(&config, Arc::clone(&hub)).await?;

    // Ctrl-C winds down the gateway and every session through the same
    // shutdown signal.
    let shutdown_hub = Arc::clone(&hub);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown_hub.lifecycle().shutdown();
            }
            Err(e) => warn!(error = %e, "Failed to listen for ctrl-c"),
        }
    });

    gateway.run().await?;

    // Give session tasks a moment to send their close frames.
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    info!(sessions = hub.session_count(), "chirpd stopped");
    Ok(())
}
