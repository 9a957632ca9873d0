//! Length-delimited binary codec for flow records on the bus.
//!
//! Each message value on the source topic is one `FlowDocument`, framed with
//! a varint length prefix so payloads are self-describing regardless of the
//! transport's own framing.

use std::fmt;

use prost::Message;

use super::model::FlowDocument;

/// Errors raised while encoding or decoding bus payloads.
#[derive(Debug, Clone)]
pub enum CodecError {
    Encode { message: String },
    Decode { message: String },
}

impl CodecError {
    pub fn encode_error(message: impl Into<String>) -> Self {
        CodecError::Encode {
            message: message.into(),
        }
    }

    pub fn decode_error(message: impl Into<String>) -> Self {
        CodecError::Decode {
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode { message } => write!(f, "flow encode error: {}", message),
            CodecError::Decode { message } => write!(f, "flow decode error: {}", message),
        }
    }
}

impl std::error::Error for CodecError {}

/// Stateless codec for `FlowDocument` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowCodec;

impl FlowCodec {
    pub fn new() -> Self {
        FlowCodec
    }

    pub fn encode(&self, flow: &FlowDocument) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(flow.encoded_len() + 4);
        flow.encode_length_delimited(&mut buf)
            .map_err(|e| CodecError::encode_error(e.to_string()))?;
        Ok(buf)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<FlowDocument, CodecError> {
        FlowDocument::decode_length_delimited(bytes)
            .map_err(|e| CodecError::decode_error(e.to_string()))
    }
}
