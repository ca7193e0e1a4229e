use common::Severity;
use serde::{Deserialize, Serialize};

use crate::{Command, ROOT_LOGGER};

/// Levels a viewer is allowed to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<ControlLevel> for Severity {
    fn from(level: ControlLevel) -> Self {
        match level {
            ControlLevel::Error => Severity::Error,
            ControlLevel::Warn => Severity::Warn,
            ControlLevel::Info => Severity::Info,
            ControlLevel::Debug => Severity::Debug,
        }
    }
}

/// One `{ logger, level, group }` entry of a `logging/update` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerDirective {
    pub logger: String,
    pub level: ControlLevel,
    pub group: bool,
}

impl LoggerDirective {
    pub fn is_root(&self) -> bool {
        self.logger == ROOT_LOGGER
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingUpdateData {
    pub loggers: Vec<LoggerDirective>,
}

/// `{ command: "logging/update", data: { loggers: [...] } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingUpdate {
    pub command: Command,
    pub data: LoggingUpdateData,
}

impl LoggingUpdate {
    pub fn new(loggers: Vec<LoggerDirective>) -> Self {
        Self { command: Command::LoggingUpdate, data: LoggingUpdateData { loggers } }
    }

    /// Levels requested for the root logger, in message order. Directives for
    /// any other logger are skipped.
    pub fn root_levels(&self) -> impl Iterator<Item = Severity> + '_ {
        self.data.loggers.iter().filter(|directive| directive.is_root()).map(|d| d.level.into())
    }
}
