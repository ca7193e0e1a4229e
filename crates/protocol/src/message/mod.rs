pub mod control;
pub mod log;
pub mod welcome;

use serde::Serialize;

pub use control::{ControlLevel, LoggerDirective, LoggingUpdate, LoggingUpdateData};
pub use log::LogRecord;
pub use welcome::Welcome;

/// Payload of an outbound frame, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Welcome(Welcome),
    Log(LogRecord),
}

/// Outbound frame: `{ path, data }`.
///
/// Immutable once built; the hub serializes it once per broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub path: String,
    pub data: Payload,
}

impl Envelope {
    pub fn log(path: impl Into<String>, record: LogRecord) -> Self {
        Self { path: path.into(), data: Payload::Log(record) }
    }

    pub fn welcome(path: impl Into<String>, welcome: Welcome) -> Self {
        Self { path: path.into(), data: Payload::Welcome(welcome) }
    }
}
