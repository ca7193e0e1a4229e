//! Types shared across the log relay crates.
//!
//! - [`Severity`] is the ordered verbosity scale.
//! - [`LogOptions`] is what callers pass when creating a logger.
//! - [`LogArg`] is one opaque argument of a log call.

mod arg;
mod error;
mod options;
mod severity;

pub use arg::{LogArg, join_args};
pub use error::SeverityError;
pub use options::{LevelSpec, LogConfig, LogOptions};
pub use severity::{DEFAULT_SEVERITY, Severity};
