//! Gremlin Server wire protocol.
//!
//! Message types, status table, request framing and SASL credentials.
//! Nothing in this module performs I/O.

pub mod codec;
pub mod error;
pub mod message;
pub mod sasl;
pub mod status;

pub use codec::{GraphSonCodec, GRAPHSON_V2_MIME};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Bindings, Request, RequestArgs, ResponseFrame, ResponseResult, ResponseStatus};
pub use status::StatusCode;
