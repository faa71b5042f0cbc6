//! Response messages.
//!
//! Every transport frame from the server carries one [`ResponseFrame`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::WireRequestId;
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::status::StatusCode;

/// Status block of a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStatus {
    /// Numeric status code
    pub code: u16,
    /// Server-supplied message
    #[serde(default)]
    pub message: String,
    /// Extra status attributes
    #[serde(default)]
    pub attributes: Value,
}

/// Result block of a response frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseResult {
    /// Result data (a list for 200/206 frames)
    #[serde(default)]
    pub data: Value,
    /// Result metadata
    #[serde(default)]
    pub meta: Value,
}

/// One response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFrame {
    /// Id of the request this frame answers
    #[serde(default)]
    pub request_id: Option<WireRequestId>,
    /// Status block
    pub status: ResponseStatus,
    /// Result block
    #[serde(default)]
    pub result: ResponseResult,
}

impl ResponseFrame {
    /// Create a frame with the given code and data.
    pub fn new(request_id: Uuid, code: u16, data: Value) -> Self {
        Self {
            request_id: Some(WireRequestId::Plain(request_id)),
            status: ResponseStatus {
                code,
                message: String::new(),
                attributes: Value::Object(Default::default()),
            },
            result: ResponseResult {
                data,
                meta: Value::Object(Default::default()),
            },
        }
    }

    /// Final (or only) frame of a result.
    pub fn success(request_id: Uuid, data: Value) -> Self {
        Self::new(request_id, StatusCode::Success.as_u16(), data)
    }

    /// Intermediate frame of a batched result.
    pub fn partial(request_id: Uuid, data: Value) -> Self {
        Self::new(request_id, StatusCode::PartialContent.as_u16(), data)
    }

    /// Empty result.
    pub fn no_content(request_id: Uuid) -> Self {
        Self::new(request_id, StatusCode::NoContent.as_u16(), Value::Null)
    }

    /// SASL challenge. `challenge_id` must be echoed by the answer.
    pub fn authenticate(challenge_id: Uuid) -> Self {
        Self::new(challenge_id, StatusCode::Authenticate.as_u16(), Value::Null)
    }

    /// Error frame with a server message.
    pub fn error(request_id: Uuid, code: u16, message: impl Into<String>) -> Self {
        let mut frame = Self::new(request_id, code, Value::Null);
        frame.status.message = message.into();
        frame
    }

    /// Request id carried by the frame.
    pub fn request_id(&self) -> Option<Uuid> {
        self.request_id.as_ref().map(WireRequestId::uuid)
    }

    /// Raw status code.
    pub fn code(&self) -> u16 {
        self.status.code
    }

    /// Status code if it is in the static table.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status.code)
    }

    /// Result data.
    pub fn data(&self) -> &Value {
        &self.result.data
    }

    /// Consume the frame, yielding its data.
    pub fn into_data(self) -> Value {
        self.result.data
    }

    /// Consume the frame, yielding its data as a list of items.
    ///
    /// Missing data counts as an empty list.
    pub fn into_items(self) -> ProtocolResult<Vec<Value>> {
        match self.result.data {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(ProtocolError::UnexpectedPayload(format!(
                "expected a list of result items, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
