//! Request messages.
//!
//! A request is either a script evaluation ([`Request::query`]) or the answer
//! to a SASL challenge ([`Request::authentication`]). Those two constructors
//! are the only way to build one, so a request never mixes both shapes.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use super::{op, processor, WireRequestId};

/// Default script language.
pub const DEFAULT_LANGUAGE: &str = "gremlin-groovy";

/// Variable bindings passed alongside a script.
pub type Bindings = serde_json::Map<String, Value>;

/// Request arguments.
///
/// Unset fields are omitted from the wire form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestArgs {
    /// Script text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gremlin: Option<String>,
    /// Session id (session processor only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Script variable bindings
    #[serde(default, skip_serializing_if = "Bindings::is_empty")]
    pub bindings: Bindings,
    /// Script language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Rebindings of graph/traversal source names
    #[serde(default, skip_serializing_if = "Bindings::is_empty")]
    pub rebindings: Bindings,
    /// Base64 SASL credential blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl: Option<String>,
    /// Number of result items per partial-content frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    /// Let the server commit/rollback around the script
    #[serde(default, skip_serializing_if = "is_false")]
    pub manage_transaction: bool,
    /// Graph/traversal source aliases
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A request to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    request_id: Uuid,
    op: String,
    processor: String,
    args: RequestArgs,
}

impl Request {
    /// Script evaluation request with a fresh request id.
    pub fn query(gremlin: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            op: op::EVAL.to_string(),
            processor: processor::STANDARD.to_string(),
            args: RequestArgs {
                gremlin: Some(gremlin.into()),
                language: Some(DEFAULT_LANGUAGE.to_string()),
                ..Default::default()
            },
        }
    }

    /// Authentication request answering the challenge `challenge_id`.
    ///
    /// `sasl` is the base64 credential blob; see [`crate::protocol::sasl`].
    pub fn authentication(challenge_id: Uuid, sasl: impl Into<String>) -> Self {
        Self {
            request_id: challenge_id,
            op: op::AUTHENTICATION.to_string(),
            processor: processor::TRAVERSAL.to_string(),
            args: RequestArgs {
                sasl: Some(sasl.into()),
                ..Default::default()
            },
        }
    }

    /// Set variable bindings.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.args.bindings = bindings;
        self
    }

    /// Add a single binding.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.bindings.insert(name.into(), value.into());
        self
    }

    /// Set rebindings.
    pub fn with_rebindings(mut self, rebindings: Bindings) -> Self {
        self.args.rebindings = rebindings;
        self
    }

    /// Set graph/traversal source aliases.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.args.aliases = aliases;
        self
    }

    /// Toggle server-managed transactions.
    pub fn with_manage_transaction(mut self, flag: bool) -> Self {
        self.args.manage_transaction = flag;
        self
    }

    /// Bind the request to a server session.
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.args.session = Some(session.into());
        self
    }

    /// Set the processor.
    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = processor.into();
        self
    }

    /// Set the script language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.args.language = Some(language.into());
        self
    }

    /// Set the number of items per partial-content frame.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.args.batch_size = Some(batch_size);
        self
    }

    /// Request id.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Operation name.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Processor name.
    pub fn processor(&self) -> &str {
        &self.processor
    }

    /// Arguments.
    pub fn args(&self) -> &RequestArgs {
        &self.args
    }

    /// Whether this answers a SASL challenge.
    pub fn is_authentication(&self) -> bool {
        self.op == op::AUTHENTICATION
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("Request", 4)?;
        envelope.serialize_field("requestId", &WireRequestId::typed(self.request_id))?;
        envelope.serialize_field("op", &self.op)?;
        envelope.serialize_field("processor", &self.processor)?;
        envelope.serialize_field("args", &self.args)?;
        envelope.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestEnvelope {
    request_id: WireRequestId,
    op: String,
    #[serde(default)]
    processor: String,
    #[serde(default)]
    args: RequestArgs,
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = RequestEnvelope::deserialize(deserializer)?;
        Ok(Self {
            request_id: envelope.request_id.uuid(),
            op: envelope.op,
            processor: envelope.processor,
            args: envelope.args,
        })
    }
}
