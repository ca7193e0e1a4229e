//! The process's logging facility.
//!
//! Creates named loggers on first reference and keeps them for the life of the
//! process. Repeated requests for the same name return the same
//! `Arc<Logger>`, so in-place changes to a logger are seen by every holder.

use std::sync::Arc;

use common::{DEFAULT_SEVERITY, LogArg, LogOptions, Severity, join_args};
use dashmap::{DashMap, mapref::entry::Entry};

use crate::logger::Logger;

/// `tracing` target used for facility output.
pub const FACILITY_TARGET: &str = "app";

/// One emitted line, handed to a [`LogWriter`].
#[derive(Debug)]
pub struct Record<'a> {
    pub logger: &'a str,
    pub label: &'a str,
    pub prefix: Option<&'a str>,
    pub severity: Severity,
    pub args: &'a [LogArg],
}

impl Record<'_> {
    /// Prefix (if any) followed by the space-joined arguments.
    pub fn line(&self) -> String {
        let joined = join_args(self.args);
        match self.prefix {
            Some(prefix) => format!("{prefix} {joined}"),
            None => joined,
        }
    }
}

/// Destination of the facility's real emitters.
pub trait LogWriter: Send + Sync {
    fn write(&self, record: &Record<'_>);
}

/// Writes records as `tracing` events under [`FACILITY_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWriter;

impl LogWriter for TracingWriter {
    fn write(&self, record: &Record<'_>) {
        let line = record.line();
        let (logger, label) = (record.logger, record.label);
        match record.severity {
            Severity::Silent => {}
            Severity::Error => tracing::error!(target: FACILITY_TARGET, logger, label, "{line}"),
            Severity::Warn => tracing::warn!(target: FACILITY_TARGET, logger, label, "{line}"),
            Severity::Info => tracing::info!(target: FACILITY_TARGET, logger, label, "{line}"),
            Severity::Debug => tracing::debug!(target: FACILITY_TARGET, logger, label, "{line}"),
            Severity::Trace => tracing::trace!(target: FACILITY_TARGET, logger, label, "{line}"),
        }
    }
}

/// Registry of named loggers.
pub struct LogFacility {
    loggers: DashMap<String, Arc<Logger>>,
    writer: Arc<dyn LogWriter>,
}

impl LogFacility {
    pub fn new(writer: Arc<dyn LogWriter>) -> Self {
        Self { loggers: DashMap::new(), writer }
    }

    /// A facility whose loggers write through `tracing`.
    pub fn with_tracing() -> Self {
        Self::new(Arc::new(TracingWriter))
    }

    /// Returns the logger named `id`, creating it if needed.
    ///
    /// A new logger is configured at the level resolved from `options`
    /// (default INFO) and takes its label and prefix from them. For an
    /// existing logger, `Some(options)` reconfigures the level and `None`
    /// leaves it untouched.
    pub fn logger(&self, id: &str, options: Option<&LogOptions>) -> Arc<Logger> {
        let level = LogOptions::resolve(options, DEFAULT_SEVERITY);
        match self.loggers.entry(id.to_owned()) {
            Entry::Occupied(entry) => {
                let logger = entry.get().clone();
                drop(entry);
                if options.is_some() {
                    logger.configure(level);
                }
                logger
            }
            Entry::Vacant(entry) => {
                let logger = Arc::new(Logger::new(
                    id,
                    options.and_then(LogOptions::label),
                    options.and_then(LogOptions::prefix),
                    self.writer.clone(),
                    level,
                ));
                entry.insert(logger.clone());
                logger
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Logger>> {
        self.loggers.get(id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every known logger.
    pub fn loggers(&self) -> Vec<Arc<Logger>> {
        self.loggers.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl Default for LogFacility {
    fn default() -> Self {
        Self::with_tracing()
    }
}
