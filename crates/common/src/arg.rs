//! Opaque loggable arguments.
//!
//! Arguments are passed through unchanged to the local log destination and to
//! remote viewers. They serialize to plain JSON values; a non-finite float has
//! no JSON representation and fails serialization.

use std::fmt;

use serde::{Serialize, Serializer, ser::Error as _};

/// One argument of a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Json(serde_json::Value),
}

impl Serialize for LogArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LogArg::Null => serializer.serialize_unit(),
            LogArg::Bool(value) => serializer.serialize_bool(*value),
            LogArg::Int(value) => serializer.serialize_i64(*value),
            LogArg::UInt(value) => serializer.serialize_u64(*value),
            LogArg::Float(value) if !value.is_finite() => {
                Err(S::Error::custom(format!("{value} cannot be represented in JSON")))
            }
            LogArg::Float(value) => serializer.serialize_f64(*value),
            LogArg::Str(value) => serializer.serialize_str(value),
            LogArg::Json(value) => value.serialize(serializer),
        }
    }
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Null => f.write_str("null"),
            LogArg::Bool(value) => write!(f, "{value}"),
            LogArg::Int(value) => write!(f, "{value}"),
            LogArg::UInt(value) => write!(f, "{value}"),
            LogArg::Float(value) => write!(f, "{value}"),
            LogArg::Str(value) => f.write_str(value),
            LogArg::Json(value) => write!(f, "{value}"),
        }
    }
}

/// Space-joins `args` the way a console would print them.
pub fn join_args(args: &[LogArg]) -> String {
    args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Str(value.to_owned())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Str(value)
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Bool(value)
    }
}

impl From<i32> for LogArg {
    fn from(value: i32) -> Self {
        LogArg::Int(value.into())
    }
}

impl From<i64> for LogArg {
    fn from(value: i64) -> Self {
        LogArg::Int(value)
    }
}

impl From<u32> for LogArg {
    fn from(value: u32) -> Self {
        LogArg::UInt(value.into())
    }
}

impl From<u64> for LogArg {
    fn from(value: u64) -> Self {
        LogArg::UInt(value)
    }
}

impl From<usize> for LogArg {
    fn from(value: usize) -> Self {
        LogArg::UInt(value as u64)
    }
}

impl From<f64> for LogArg {
    fn from(value: f64) -> Self {
        LogArg::Float(value)
    }
}

impl From<serde_json::Value> for LogArg {
    fn from(value: serde_json::Value) -> Self {
        LogArg::Json(value)
    }
}

/// Builds a `[LogArg; N]` from heterogeneous values.
///
/// ```
/// use common::{LogArg, log_args};
///
/// let args = log_args!["listening on", 8080];
/// assert_eq!(args[1], LogArg::Int(8080));
/// ```
#[macro_export]
macro_rules! log_args {
    ($($arg:expr),* $(,)?) => {
        [$($crate::LogArg::from($arg)),*]
    };
}
