//! chirp-relay - real-time messaging and presence relay.
//!
//! Clients open a WebSocket, bind an identity with `join`, and exchange
//! `sendMessage` / `receiveMessage` events. The relay keeps a registry of
//! live sessions per user and fans every message out to all sessions of
//! its receiver. Nothing is stored.
//!
//! The binary (`chirpd`) wires these modules together; integration tests
//! use them directly to run an in-process relay.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod network;
pub mod security;
pub mod state;
pub mod telemetry;

pub use error::{RelayError, RelayResult};
pub use network::Gateway;
pub use state::Hub;
