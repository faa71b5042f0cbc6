//! Request and response messages.
//!
//! Requests travel client → server as a GraphSON envelope; responses come
//! back as one JSON document per transport frame.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operation names.
pub mod op {
    /// Evaluate a script
    pub const EVAL: &str = "eval";
    /// Answer a SASL challenge
    pub const AUTHENTICATION: &str = "authentication";
}

/// Processor names.
pub mod processor {
    /// Default sessionless processor (empty name)
    pub const STANDARD: &str = "";
    /// Session-bound processor
    pub const SESSION: &str = "session";
    /// Traversal processor, which also answers SASL challenges
    pub const TRAVERSAL: &str = "traversal";
}

/// GraphSON type tag for UUID values.
pub const UUID_TYPE: &str = "g:UUID";

/// A request id as it appears on the wire.
///
/// Requests always carry the typed GraphSON form
/// (`{"@type": "g:UUID", "@value": "..."}`); servers may answer with either
/// the typed form or a bare UUID string, so both are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRequestId {
    /// Typed GraphSON value
    Typed {
        /// Type tag
        #[serde(rename = "@type", default = "uuid_type")]
        kind: String,
        /// UUID value
        #[serde(rename = "@value")]
        value: Uuid,
    },
    /// Bare UUID string
    Plain(Uuid),
}

fn uuid_type() -> String {
    UUID_TYPE.to_string()
}

impl WireRequestId {
    /// Typed form of an id.
    pub fn typed(id: Uuid) -> Self {
        WireRequestId::Typed {
            kind: uuid_type(),
            value: id,
        }
    }

    /// The UUID carried by either form.
    pub fn uuid(&self) -> Uuid {
        match self {
            WireRequestId::Typed { value, .. } => *value,
            WireRequestId::Plain(id) => *id,
        }
    }
}
