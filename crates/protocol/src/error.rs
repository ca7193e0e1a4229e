/// Error returned when an inbound frame is not a parseable message.
///
/// A frame that parses but does not match any known command is not an error;
/// the codec reports it as unrecognized instead.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("frame is not valid UTF-8")]
    NotUtf8,
}

/// Error returned when a message cannot be serialized.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("message could not be serialized: {0}")]
    Json(#[from] serde_json::Error),
}
