//! Test server management.
//!
//! Runs a relay inside the test process, bound to `127.0.0.1:0`, so tests
//! can run in parallel and inspect the Hub directly.

use chirp_relay::config::Config;
use chirp_relay::{Gateway, Hub};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

const BASE_CONFIG: &str = r#"
[server]
name = "chirp.test"
metrics_port = 0

[listen]
address = "127.0.0.1:0"

[limits]
message_rate_per_second = 0
"#;

/// A test relay instance.
pub struct TestServer {
    addr: SocketAddr,
    hub: Arc<Hub>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    /// Spawn a relay with the default test configuration.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn a relay after letting the caller adjust the configuration.
    pub async fn spawn_with(edit: impl FnOnce(&mut Config)) -> anyhow::Result<Self> {
        let mut config = Config::parse(BASE_CONFIG)?;
        edit(&mut config);

        let hub = Arc::new(Hub::new(&config)?);
        let gateway = Gateway::bind(&config, Arc::clone(&hub)).await?;
        let addr = gateway.local_addr()?;
        let task = tokio::spawn(gateway.run());

        Ok(Self { addr, hub, task })
    }

    /// WebSocket URL of the relay.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Shared relay state, for assertions.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Create a raw test client connected to this relay.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.url()).await
    }

    /// Wait until `predicate` holds for the Hub.
    pub async fn wait_until<F>(&self, mut predicate: F) -> anyhow::Result<()>
    where
        F: FnMut(&Hub) -> bool,
    {
        for _ in 0..250 {
            if predicate(&self.hub) {
                return Ok(());
            }
            sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("condition not reached within 5 seconds")
    }

    /// Wait until `user_id` has exactly `count` bound sessions.
    pub async fn wait_for_sessions(&self, user_id: &str, count: usize) -> anyhow::Result<()> {
        self.wait_until(|hub| hub.registry().sessions_for(user_id).len() == count)
            .await
            .map_err(|e| anyhow::anyhow!("{user_id} never reached {count} sessions: {e}"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.hub.lifecycle().shutdown();
        self.task.abort();
    }
}
