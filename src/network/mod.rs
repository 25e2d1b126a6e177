//! Network layer: the listening gateway and per-session connection tasks.

mod connection;
mod gateway;

pub use connection::{CloseReason, Connection};
pub use gateway::Gateway;
