//! JSON text-frame encoding and decoding.
//!
//! Decoding goes through a loose envelope first so an unknown event name is
//! reported as [`ProtocolError::UnknownEvent`] rather than a serde error.

use crate::error::{ProtocolError, Result};
use crate::event::{ChatMessage, ClientEvent, JoinRequest, SendMessage, ServerEvent};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decode a client→server frame.
///
/// `sendMessage` payloads are validated here; a missing `receiverId` or
/// `content` fails with [`ProtocolError::MissingField`].
pub fn decode_client_event(text: &str) -> Result<ClientEvent> {
    let Envelope { event, data } = serde_json::from_str(text)?;
    match event.as_str() {
        "join" => {
            let req: JoinRequest = serde_json::from_value(data)?;
            if req.user_id.is_empty() {
                return Err(ProtocolError::MissingField { field: "userId" });
            }
            Ok(ClientEvent::Join(req))
        }
        "sendMessage" => {
            let msg: SendMessage = serde_json::from_value(data)?;
            msg.validate()?;
            Ok(ClientEvent::SendMessage(msg))
        }
        _ => Err(ProtocolError::UnknownEvent(event)),
    }
}

/// Decode a server→client frame.
pub fn decode_server_event(text: &str) -> Result<ServerEvent> {
    let Envelope { event, data } = serde_json::from_str(text)?;
    match event.as_str() {
        "receiveMessage" => {
            let msg: ChatMessage = serde_json::from_value(data)?;
            Ok(ServerEvent::ReceiveMessage(msg))
        }
        _ => Err(ProtocolError::UnknownEvent(event)),
    }
}

/// Encode a client→server event as a JSON text frame.
pub fn encode_client_event(event: &ClientEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

/// Encode a server→client event as a JSON text frame.
pub fn encode_server_event(event: &ServerEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}
