use serde_json::Value;

use crate::{
    error::{DecodeError, EncodeError},
    message::{Envelope, LoggingUpdate},
};

/// Relay side of the protocol: encodes frames for viewers and decodes the
/// commands they send.
pub struct ServerCodec;

impl ServerCodec {
    /// Serializes an outbound [`Envelope`] into a JSON text frame.
    pub fn encode(&self, envelope: &Envelope) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(envelope)?)
    }

    /// Parses an inbound text frame.
    ///
    /// Returns an error only when the text is not JSON at all. JSON that does
    /// not have the shape of a known command yields `Ok(None)`.
    pub fn decode(&self, text: &str) -> Result<Option<LoggingUpdate>, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
        if !value.is_object() {
            return Ok(None);
        }
        Ok(serde_json::from_value(value).ok())
    }

    /// Same as [`ServerCodec::decode`] for a frame delivered as raw bytes.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Option<LoggingUpdate>, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
        self.decode(text)
    }
}

/// Viewer side of the protocol.
pub struct ClientCodec;

impl ClientCodec {
    /// Serializes a command into a JSON text frame.
    pub fn encode(&self, update: &LoggingUpdate) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(update)?)
    }
}
