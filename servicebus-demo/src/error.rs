//! Errors surfaced by trigger handlers.

use thiserror::Error;

/// Why a handler rejected a message.
///
/// Any of these fails the delivery; the runtime decides what the bus does
/// with the message next.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("message body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("failed to parse JSON message: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected field type in message: {source}")]
    FieldType {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HandlerError {
    /// Short machine-readable tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::InvalidUtf8(_) => "invalid_utf8",
            HandlerError::Decode { .. } => "decode",
            HandlerError::FieldType { .. } => "field_type",
        }
    }
}
