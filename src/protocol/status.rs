//! Response status codes.
//!
//! The server reports the outcome of every frame with a numeric code. Three
//! codes (200, 204, 206) are non-errors; the rest carry a fixed description.

use std::fmt;

/// Known response status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    /// Final (or only) frame of a successful response
    Success = 200,
    /// Successful response with no data
    NoContent = 204,
    /// One chunk of a multi-frame response; more frames follow
    PartialContent = 206,
    /// Credentials were rejected
    Unauthorized = 401,
    /// Server demands SASL authentication before answering
    Authenticate = 407,
    /// Request could not be parsed
    MalformedRequest = 498,
    /// Request arguments are invalid
    InvalidRequestArguments = 499,
    /// Generic server failure
    ServerError = 500,
    /// Script failed to evaluate
    ScriptEvaluationError = 597,
    /// Script exceeded the server's evaluation timeout
    ServerTimeout = 598,
    /// Server could not serialize the result
    ServerSerializationError = 599,
}

impl StatusCode {
    /// Every known status code.
    pub const ALL: [StatusCode; 11] = [
        StatusCode::Success,
        StatusCode::NoContent,
        StatusCode::PartialContent,
        StatusCode::Unauthorized,
        StatusCode::Authenticate,
        StatusCode::MalformedRequest,
        StatusCode::InvalidRequestArguments,
        StatusCode::ServerError,
        StatusCode::ScriptEvaluationError,
        StatusCode::ServerTimeout,
        StatusCode::ServerSerializationError,
    ];

    /// Look up a raw code in the static table.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_u16() == code)
    }

    /// Raw numeric code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether this code signals an error.
    pub fn is_error(self) -> bool {
        !matches!(
            self,
            StatusCode::Success | StatusCode::NoContent | StatusCode::PartialContent
        )
    }

    /// Fixed human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            StatusCode::Success => "Success",
            StatusCode::NoContent => "No Content",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Authenticate => "Authenticate",
            StatusCode::MalformedRequest => "Malformed Request",
            StatusCode::InvalidRequestArguments => "Invalid Request Arguments",
            StatusCode::ServerError => "Server Error",
            StatusCode::ScriptEvaluationError => "Script Evaluation Error",
            StatusCode::ServerTimeout => "Server Timeout",
            StatusCode::ServerSerializationError => "Server Serialization Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.description())
    }
}
