//! Event types exchanged between clients and the relay.
//!
//! Field names follow the JavaScript client (`camelCase`). Unknown fields on
//! a chat message are preserved and forwarded verbatim.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat message as delivered to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Identity of the sending user.
    pub sender_id: String,
    /// Identity of the receiving user.
    pub receiver_id: String,
    /// Message body. Opaque to the relay.
    pub content: String,
    /// Client-assigned timestamp. Forwarded as-is, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<Value>,
    /// Any additional client fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `sendMessage` event as submitted by a client.
///
/// Every field is optional on the wire so that a missing field is reported
/// as [`ProtocolError::MissingField`] instead of a generic parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    /// Claimed sender identity. May be absent when the session is bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    /// Target user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Client-assigned timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<Value>,
    /// Any additional client fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendMessage {
    /// Build a message addressed to `receiver_id`.
    pub fn new(receiver_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            receiver_id: Some(receiver_id.into()),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Set the claimed sender.
    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the client timestamp.
    pub fn with_sent_at(mut self, sent_at: impl Into<Value>) -> Self {
        self.sent_at = Some(sent_at.into());
        self
    }

    /// Check that `receiverId` and `content` are present and non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.receiver_id.as_deref().is_none_or(str::is_empty) {
            return Err(ProtocolError::MissingField { field: "receiverId" });
        }
        if self.content.as_deref().is_none_or(str::is_empty) {
            return Err(ProtocolError::MissingField { field: "content" });
        }
        Ok(())
    }

    /// Convert into the forwarded form, stamping the effective sender.
    ///
    /// Fails with [`ProtocolError::MissingField`] if validation fails.
    pub fn into_chat_message(self, sender_id: String) -> Result<ChatMessage> {
        self.validate()?;
        Ok(ChatMessage {
            sender_id,
            receiver_id: self.receiver_id.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            sent_at: self.sent_at,
            extra: self.extra,
        })
    }
}

/// Payload of a `join` event.
///
/// On the wire this is either a bare user id string or an object carrying
/// a bearer token as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JoinPayload", into = "JoinPayload")]
pub struct JoinRequest {
    /// Claimed user identity.
    pub user_id: String,
    /// Optional bearer token proving the identity.
    pub token: Option<String>,
}

impl JoinRequest {
    /// A join that only claims an identity.
    pub fn claim(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: None,
        }
    }

    /// A join backed by a bearer token.
    pub fn with_token(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: Some(token.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum JoinPayload {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Full {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

impl From<JoinPayload> for JoinRequest {
    fn from(payload: JoinPayload) -> Self {
        match payload {
            JoinPayload::Bare(user_id) => Self {
                user_id,
                token: None,
            },
            JoinPayload::Full { user_id, token } => Self { user_id, token },
        }
    }
}

impl From<JoinRequest> for JoinPayload {
    fn from(req: JoinRequest) -> Self {
        match req.token {
            None => JoinPayload::Bare(req.user_id),
            Some(token) => JoinPayload::Full {
                user_id: req.user_id,
                token: Some(token),
            },
        }
    }
}

/// Events sent from a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Bind this session to a user identity.
    Join(JoinRequest),
    /// Relay a chat message to another user.
    SendMessage(SendMessage),
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::SendMessage(_) => "sendMessage",
        }
    }
}

/// Events sent from the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message addressed to the user bound to this session.
    ReceiveMessage(ChatMessage),
}
