//! Protocol error types.

use std::fmt;
use std::io;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire frames.
#[derive(Debug)]
pub enum ProtocolError {
    /// I/O error
    Io(io::Error),

    /// JSON (de)serialization error
    Json(serde_json::Error),

    /// Frame is structurally invalid (truncated, missing fields, etc.)
    InvalidFrame(String),

    /// Frame carries a content type this client does not speak
    UnsupportedMimeType(String),

    /// Content type identifier does not fit the one-byte length prefix
    MimeTypeTooLong {
        /// Length of the rejected mime type in bytes
        len: usize,
    },

    /// Payload has an unexpected shape (e.g. partial content that is not a list)
    UnexpectedPayload(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
            ProtocolError::Json(e) => write!(f, "JSON error: {}", e),
            ProtocolError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            ProtocolError::UnsupportedMimeType(mime) => {
                write!(f, "Unsupported mime type: {}", mime)
            }
            ProtocolError::MimeTypeTooLong { len } => {
                write!(f, "Mime type too long: {} bytes (max: {})", len, u8::MAX)
            }
            ProtocolError::UnexpectedPayload(msg) => write!(f, "Unexpected payload: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Io(e) => Some(e),
            ProtocolError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        ProtocolError::Io(err)
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Json(err)
    }
}
