use chrono::Utc;
use common::{LogArg, Severity};
use serde::Serialize;

use crate::THREAD_PLACEHOLDER;

/// One intercepted log call, as delivered to viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub level: Severity,
    pub logger: String,
    pub thread: &'static str,
    /// The call's arguments, unchanged.
    pub message: Vec<LogArg>,
    /// Epoch milliseconds.
    pub ts: i64,
}

impl LogRecord {
    /// Stamps a record with the current time.
    pub fn new(level: Severity, logger: impl Into<String>, message: Vec<LogArg>) -> Self {
        Self {
            level,
            logger: logger.into(),
            thread: THREAD_PLACEHOLDER,
            message,
            ts: Utc::now().timestamp_millis(),
        }
    }
}
