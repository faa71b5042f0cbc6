//! GraphSON request codec for tokio_util.
//!
//! A request frame is a one-byte mime length, the mime type, then the JSON
//! envelope. Responses carry bare JSON with no prefix. The transport is
//! message oriented, so one buffer always holds exactly one frame.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::{ProtocolError, ProtocolResult};
use super::message::{Request, ResponseFrame};

/// GraphSON 2.0 mime type.
pub const GRAPHSON_V2_MIME: &str = "application/vnd.gremlin-v2.0+json";

/// Codec for request frames.
#[derive(Debug, Clone)]
pub struct GraphSonCodec {
    mime_type: String,
}

impl GraphSonCodec {
    /// Create a codec speaking GraphSON 2.0.
    pub fn new() -> Self {
        Self {
            mime_type: GRAPHSON_V2_MIME.to_string(),
        }
    }

    /// Create a codec with a custom mime type.
    pub fn with_mime_type(mime_type: impl Into<String>) -> ProtocolResult<Self> {
        let mime_type = mime_type.into();
        if mime_type.len() > u8::MAX as usize {
            return Err(ProtocolError::MimeTypeTooLong {
                len: mime_type.len(),
            });
        }
        Ok(Self { mime_type })
    }

    /// Mime type written in front of every request.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encode a request into a standalone frame.
    pub fn encode_request(&self, request: &Request) -> ProtocolResult<Bytes> {
        let mut buf = BytesMut::new();
        self.write_request(request, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a request frame.
    pub fn decode_request(&self, frame: &[u8]) -> ProtocolResult<Request> {
        let (&len, rest) = frame
            .split_first()
            .ok_or_else(|| ProtocolError::InvalidFrame("empty frame".to_string()))?;
        let len = len as usize;

        if rest.len() < len {
            return Err(ProtocolError::InvalidFrame(format!(
                "mime type truncated: need {} bytes, have {}",
                len,
                rest.len()
            )));
        }

        let (mime, body) = rest.split_at(len);
        if mime != self.mime_type.as_bytes() {
            return Err(ProtocolError::UnsupportedMimeType(
                String::from_utf8_lossy(mime).into_owned(),
            ));
        }

        Ok(serde_json::from_slice(body)?)
    }

    /// Decode a response frame.
    pub fn decode_response(&self, frame: &[u8]) -> ProtocolResult<ResponseFrame> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// Encode a response frame.
    pub fn encode_response(&self, response: &ResponseFrame) -> ProtocolResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(response)?))
    }

    fn write_request(&self, request: &Request, dst: &mut BytesMut) -> ProtocolResult<()> {
        let body = serde_json::to_vec(request)?;

        dst.reserve(1 + self.mime_type.len() + body.len());
        dst.put_u8(self.mime_type.len() as u8);
        dst.put_slice(self.mime_type.as_bytes());
        dst.put_slice(&body);

        Ok(())
    }
}

impl Default for GraphSonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Encoder<&'a Request> for GraphSonCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: &'a Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.write_request(item, dst)
    }
}

impl Decoder for GraphSonCodec {
    type Item = Request;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let frame = src.split();
        self.decode_request(&frame).map(Some)
    }
}
