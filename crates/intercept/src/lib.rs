//! In-process log interception.
//!
//! [`LogFacility`] owns the named loggers. [`InterceptingLoggerFactory`]
//! wraps them on demand so that every call is both emitted locally and
//! published to a [`RelaySink`].

pub mod facility;
pub mod factory;
pub mod logger;
pub mod sink;

pub use facility::{FACILITY_TARGET, LogFacility, LogWriter, Record, TracingWriter};
pub use factory::{InterceptingLoggerFactory, InterceptionControl};
pub use logger::{CallKind, EmitFn, EmitSlots, EnabledFlags, Logger};
pub use sink::{RelaySink, SinkError};
