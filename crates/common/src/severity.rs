//! Ordered severity scale shared by the facility, the interceptor and the
//! wire protocol.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SeverityError;

/// Severity used whenever a requested level is absent or unrecognized.
pub const DEFAULT_SEVERITY: Severity = Severity::Info;

/// Log verbosity. Higher rank means more verbose.
///
/// A message of severity `S` is emitted iff `S <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    /// All output switched off.
    Silent = 0,
    Error = 1,
    Warn = 2,
    #[default]
    Info = 3,
    Debug = 4,
    /// Most detailed level. `SILLY` and `VERBOSE` are accepted as synonyms.
    Trace = 5,
}

impl Severity {
    /// Every severity, least verbose first.
    pub const ALL: [Severity; 6] = [
        Severity::Silent,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Silent => "SILENT",
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    /// Case-insensitive exact match against the six names and the trace
    /// synonyms.
    pub fn from_name(name: &str) -> Result<Self, SeverityError> {
        let severity = match name.to_ascii_uppercase().as_str() {
            "SILENT" => Severity::Silent,
            "ERROR" => Severity::Error,
            "WARN" => Severity::Warn,
            "INFO" => Severity::Info,
            "DEBUG" => Severity::Debug,
            "TRACE" | "SILLY" | "VERBOSE" => Severity::Trace,
            _ => return Err(SeverityError::UnknownName(name.to_owned())),
        };
        Ok(severity)
    }

    pub fn from_rank(rank: i64) -> Result<Self, SeverityError> {
        match rank {
            0 => Ok(Severity::Silent),
            1 => Ok(Severity::Error),
            2 => Ok(Severity::Warn),
            3 => Ok(Severity::Info),
            4 => Ok(Severity::Debug),
            5 => Ok(Severity::Trace),
            other => Err(SeverityError::UnknownRank(other)),
        }
    }

    /// Returns true if a message at `message` passes `threshold`.
    pub fn permits(threshold: Severity, message: Severity) -> bool {
        message <= threshold
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl TryFrom<u8> for Severity {
    type Error = SeverityError;

    fn try_from(rank: u8) -> Result<Self, SeverityError> {
        Self::from_rank(rank.into())
    }
}
