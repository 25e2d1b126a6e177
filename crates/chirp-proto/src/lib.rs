//! # chirp-proto
//!
//! Wire protocol for the Chirp real-time relay, plus the client-side
//! transport adapter.
//!
//! Every frame is a JSON text frame carrying an event envelope:
//!
//! ```text
//! { "event": "join",           "data": "alice" }
//! { "event": "sendMessage",    "data": { "receiverId": "bob", "content": "hey" } }
//! { "event": "receiveMessage", "data": { "senderId": "alice", "receiverId": "bob", "content": "hey" } }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use chirp_proto::{ClientEvent, decode_client_event};
//!
//! let event = decode_client_event(r#"{"event":"join","data":"alice"}"#).unwrap();
//! assert!(matches!(event, ClientEvent::Join(_)));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod event;

#[cfg(feature = "tokio")]
pub mod client;

pub use codec::{decode_client_event, decode_server_event, encode_client_event, encode_server_event};
pub use error::{ProtocolError, Result};
pub use event::{ChatMessage, ClientEvent, JoinRequest, SendMessage, ServerEvent};

#[cfg(feature = "tokio")]
pub use client::{ClientError, RelayClient};
