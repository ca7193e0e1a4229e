use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Greeting sent once to each viewer right after it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub message: String,
    pub path: String,
    pub remote_address: String,
    /// ISO-8601, millisecond precision, UTC.
    pub timestamp: String,
}

impl Welcome {
    pub fn new(
        message: impl Into<String>,
        path: impl Into<String>,
        remote_address: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            remote_address: remote_address.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
