//! State management module.
//!
//! Contains the Hub (shared relay state) and the per-session types it tracks.

mod hub;
mod lifecycle;
mod machine;
mod registry;
mod session;

pub use hub::{Delivery, Hub, Outbound};
pub use lifecycle::LifecycleManager;
pub use machine::{Phase, Transition};
pub use registry::{BindOutcome, SessionRegistry, UserId};
pub use session::Session;

/// Opaque identifier of one live connection.
pub type SessionId = uuid::Uuid;
