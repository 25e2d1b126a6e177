//! Integration test common infrastructure.
//!
//! Provides an in-process relay on an ephemeral port and a raw WebSocket
//! client for asserting on event flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

/// Shared secret used by token-mode tests.
#[allow(dead_code)]
pub const TEST_SECRET: &str = "integration-secret-0123456789abcdef";
