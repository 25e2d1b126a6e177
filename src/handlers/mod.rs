//! Client event handlers.
//!
//! A connection task feeds every text frame it reads through
//! [`handle_frame`]. Events from one session are handled strictly one after
//! another; nothing here spawns.
//!
//! - `join`: [`join::handle_join`] binds the session to an identity.
//! - `sendMessage`: [`message::handle_send_message`] relays to the receiver.

pub mod join;
pub mod message;

use crate::error::RelayResult;
use crate::state::{Hub, Session};
use crate::telemetry::EventTimer;
use chirp_proto::{ClientEvent, ProtocolError, decode_client_event};

pub use join::handle_join;
pub use message::handle_send_message;

/// Handler context passed to each event handler.
pub struct Context<'a> {
    /// Shared relay state.
    pub hub: &'a Hub,
    /// The session the event arrived on.
    pub session: &'a mut Session,
}

impl<'a> Context<'a> {
    pub fn new(hub: &'a Hub, session: &'a mut Session) -> Self {
        Self { hub, session }
    }
}

/// Decode one inbound text frame and handle it.
///
/// Frames longer than `limits.max_frame_bytes` are refused before parsing.
pub async fn handle_frame(ctx: &mut Context<'_>, text: &str) -> RelayResult {
    let limit = ctx.hub.limits().max_frame_bytes;
    if text.len() > limit {
        return Err(ProtocolError::FrameTooLarge {
            len: text.len(),
            limit,
        }
        .into());
    }
    let event = decode_client_event(text)?;
    dispatch(ctx, event).await
}

/// Route a decoded event to its handler.
pub async fn dispatch(ctx: &mut Context<'_>, event: ClientEvent) -> RelayResult {
    let _timer = EventTimer::new(event.name());
    match event {
        ClientEvent::Join(request) => handle_join(ctx, request).await.map(drop),
        ClientEvent::SendMessage(message) => handle_send_message(ctx, message).map(drop),
    }
}
