//! Error types for the relay wire protocol.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while decoding or validating a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON or does not match the envelope shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope names an event this side does not accept.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A required field is missing or empty.
    #[error("invalid message: missing or empty field `{field}`")]
    MissingField {
        /// Wire name of the offending field.
        field: &'static str,
    },

    /// The frame exceeds the configured size limit.
    #[error("frame too large: {len} bytes (limit {limit})")]
    FrameTooLarge {
        /// Received frame length in bytes.
        len: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Only text frames carry events.
    #[error("binary frames are not supported")]
    BinaryFrame,
}

impl ProtocolError {
    /// Static error code for logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::UnknownEvent(_) => "unknown_event",
            Self::MissingField { .. } => "missing_field",
            Self::FrameTooLarge { .. } => "frame_too_large",
            Self::BinaryFrame => "binary_frame",
        }
    }
}
