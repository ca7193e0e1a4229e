//! Intercepting logger factory.
//!
//! Sits in front of the [`LogFacility`]. While active, every logger is forced
//! to construct all six emitters, has them saved once, and gets relay
//! wrappers installed that call the saved emitter and then publish a
//! [`LogRecord`] to the [`RelaySink`]. A single root level gates every logger
//! while active. Deactivation writes the saved emitters back and restores each
//! logger's own level.

use std::{collections::HashMap, sync::Arc};

use common::{DEFAULT_SEVERITY, LogArg, LogOptions, Severity};
use parking_lot::Mutex;
use protocol::{Envelope, LogRecord, RELAY_PATH};
use tracing::{debug, info, warn};

use crate::{
    facility::LogFacility,
    logger::{CallKind, EmitFn, EmitSlots, Logger, noop},
    sink::RelaySink,
};

/// The operations the connection hub drives.
pub trait InterceptionControl: Send + Sync {
    /// Installs relay wrappers on every known logger. Idempotent.
    fn activate(&self);
    /// Restores every logger to its pre-activation state. Idempotent.
    fn deactivate(&self);
    /// Stores a new root level and, while active, applies it to every logger.
    fn set_root_level(&self, level: Severity);
}

struct InterceptState {
    active: bool,
    root: Severity,
    /// Level each logger was created or last explicitly configured with,
    /// restored on deactivation.
    original_levels: HashMap<String, Severity>,
}

pub struct InterceptingLoggerFactory {
    facility: Arc<LogFacility>,
    sink: Arc<dyn RelaySink>,
    path: String,
    state: Mutex<InterceptState>,
}

impl InterceptingLoggerFactory {
    pub fn new(facility: Arc<LogFacility>, sink: Arc<dyn RelaySink>) -> Self {
        Self {
            facility,
            sink,
            path: RELAY_PATH.to_owned(),
            state: Mutex::new(InterceptState {
                active: false,
                root: DEFAULT_SEVERITY,
                original_levels: HashMap::new(),
            }),
        }
    }

    /// Overrides the channel path stamped into relayed events.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn facility(&self) -> &Arc<LogFacility> {
        &self.facility
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn root_level(&self) -> Severity {
        self.state.lock().root
    }

    /// The level `id` will be restored to on deactivation, if recorded.
    pub fn original_level(&self, id: &str) -> Option<Severity> {
        self.state.lock().original_levels.get(id).copied()
    }

    /// Logger-creation entry point for the host process.
    ///
    /// While inactive this is the facility itself. While active the logger is
    /// wrapped before it is returned, and the level the caller asked for is
    /// remembered for restoration.
    pub fn logger(&self, id: &str, options: Option<LogOptions>) -> Arc<Logger> {
        let mut state = self.state.lock();
        if !state.active {
            drop(state);
            return self.facility.logger(id, options.as_ref());
        }

        match self.facility.get(id) {
            Some(existing) if options.is_none() => Self::remember(&mut state, &existing),
            _ => {
                let requested = LogOptions::resolve(options.as_ref(), DEFAULT_SEVERITY);
                state.original_levels.insert(id.to_owned(), requested);
            }
        }
        self.wrap(id, options.as_ref(), state.root)
    }

    /// Wraps one logger at `root`.
    ///
    /// A logger seen for the first time is reconfigured at TRACE so all six
    /// emitters exist, and those are saved. An already saved set is reused,
    /// never replaced, so wrappers are always built on the real emitters.
    fn wrap(&self, id: &str, options: Option<&LogOptions>, root: Severity) -> Arc<Logger> {
        let logger = match self.facility.get(id) {
            Some(logger) if logger.has_pristine() => logger,
            _ => {
                let forced = LogOptions::with_level(options, Severity::Trace);
                self.facility.logger(id, Some(&forced))
            }
        };
        let pristine = logger.pristine_or_snapshot();

        let slots = EmitSlots::from_fn(|kind| {
            if Severity::permits(root, kind.severity()) {
                self.relay(logger.id(), kind, pristine.get(kind).clone())
            } else {
                noop()
            }
        });
        logger.install(slots, root);
        logger
    }

    /// Builds a wrapper that calls `pristine` with the arguments unchanged,
    /// then publishes the call as a log event.
    fn relay(&self, logger_id: &str, kind: CallKind, pristine: EmitFn) -> EmitFn {
        let sink = self.sink.clone();
        let path = self.path.clone();
        let logger_id = logger_id.to_owned();
        let severity = kind.severity();

        Arc::new(move |args: &[LogArg]| {
            pristine(args);
            let record = LogRecord::new(severity, logger_id.as_str(), args.to_vec());
            if let Err(error) = sink.publish(Envelope::log(path.as_str(), record)) {
                warn!(logger = %logger_id, %error, "failed to relay log event");
            }
        })
    }

    /// Remembers `logger`'s current level unless one is already recorded.
    fn remember(state: &mut InterceptState, logger: &Logger) {
        state.original_levels.entry(logger.id().to_owned()).or_insert_with(|| logger.level());
    }
}

impl InterceptionControl for InterceptingLoggerFactory {
    fn activate(&self) {
        let mut state = self.state.lock();
        if state.active {
            debug!("log interception already active");
            return;
        }
        state.active = true;

        let loggers = self.facility.loggers();
        for logger in &loggers {
            Self::remember(&mut state, logger);
        }
        for logger in &loggers {
            self.wrap(logger.id(), None, state.root);
        }
        info!(loggers = loggers.len(), root = %state.root, "log interception activated");
    }

    fn deactivate(&self) {
        let mut state = self.state.lock();
        if !state.active {
            debug!("log interception already inactive");
            return;
        }
        state.active = false;

        let loggers = self.facility.loggers();
        for logger in &loggers {
            let restored = logger.restore_pristine();
            let original = state.original_levels.get(logger.id()).copied();
            match (original, restored) {
                (Some(level), _) => {
                    self.facility.logger(logger.id(), Some(&LogOptions::from(level)));
                }
                (None, true) => {
                    self.facility.logger(logger.id(), Some(&LogOptions::from(DEFAULT_SEVERITY)));
                }
                (None, false) => {}
            }
        }
        state.original_levels.clear();
        info!(loggers = loggers.len(), "log interception deactivated");
    }

    fn set_root_level(&self, level: Severity) {
        let mut state = self.state.lock();
        state.root = level;
        if !state.active {
            debug!(root = %level, "root level stored for next activation");
            return;
        }

        let loggers = self.facility.loggers();
        for logger in &loggers {
            Self::remember(&mut state, logger);
            self.wrap(logger.id(), None, level);
        }
        info!(loggers = loggers.len(), root = %level, "root level applied");
    }
}

#[cfg(test)]
mod tests {
    use common::log_args;
    use protocol::Payload;

    use super::*;
    use crate::{facility::tests::RecordingWriter, logger::is_noop, sink::SinkError};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<Envelope>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self { events: Mutex::new(Vec::new()), fail: true }
        }

        fn records(&self) -> Vec<LogRecord> {
            self.events
                .lock()
                .iter()
                .filter_map(|envelope| match &envelope.data {
                    Payload::Log(record) => Some(record.clone()),
                    Payload::Welcome(_) => None,
                })
                .collect()
        }
    }

    impl RelaySink for RecordingSink {
        fn publish(&self, envelope: Envelope) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Closed);
            }
            self.events.lock().push(envelope);
            Ok(())
        }
    }

    struct Fixture {
        factory: InterceptingLoggerFactory,
        writer: Arc<RecordingWriter>,
        sink: Arc<RecordingSink>,
    }

    fn fixture_with(sink: RecordingSink) -> Fixture {
        let writer = Arc::new(RecordingWriter::default());
        let facility = Arc::new(LogFacility::new(writer.clone()));
        let sink = Arc::new(sink);
        let factory = InterceptingLoggerFactory::new(facility, sink.clone());
        Fixture { factory, writer, sink }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingSink::default())
    }

    // --- gating ---

    #[test]
    fn threshold_matrix() {
        let thresholds =
            [Severity::Error, Severity::Warn, Severity::Info, Severity::Debug, Severity::Trace];
        for threshold in thresholds {
            for kind in CallKind::ALL {
                let fx = fixture();
                let logger = fx.factory.logger("app", None);
                fx.factory.activate();
                fx.factory.set_root_level(threshold);

                logger.emit(kind, &log_args!["msg"]);

                let expected = usize::from(Severity::permits(threshold, kind.severity()));
                assert_eq!(fx.writer.count(), expected, "{kind:?} at {threshold}");
                assert_eq!(fx.sink.records().len(), expected, "{kind:?} at {threshold}");
            }
        }
    }

    #[test]
    fn relayed_event_carries_call_details() {
        let fx = fixture();
        let logger = fx.factory.logger("db", None);
        fx.factory.activate();

        logger.log(&log_args!["rows", 3]);

        let events = fx.sink.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, RELAY_PATH);
        let Payload::Log(record) = &events[0].data else { panic!("expected a log payload") };
        assert_eq!(record.level, Severity::Info);
        assert_eq!(record.logger, "db");
        assert_eq!(record.message, log_args!["rows", 3].to_vec());
        assert_eq!(fx.writer.lines(), vec!["rows 3".to_owned()]);
    }

    #[test]
    fn root_level_overrides_requested_level() {
        let fx = fixture();
        let quiet = fx.factory.logger("quiet", Some(LogOptions::from("error")));
        let chatty = fx.factory.logger("chatty", Some(LogOptions::from("trace")));
        fx.factory.activate();
        fx.factory.set_root_level(Severity::Warn);

        for logger in [&quiet, &chatty] {
            logger.warn(&log_args!["w"]);
            logger.info(&log_args!["i"]);
            logger.debug(&log_args!["d"]);
        }

        assert_eq!(fx.sink.records().len(), 2);
        assert_eq!(quiet.level(), Severity::Warn);
        assert_eq!(chatty.level(), Severity::Warn);
        assert!(chatty.is_enabled(Severity::Warn));
        assert!(!chatty.is_enabled(Severity::Info));
    }

    #[test]
    fn sink_failure_does_not_reach_caller() {
        let fx = fixture_with(RecordingSink::failing());
        let logger = fx.factory.logger("app", None);
        fx.factory.activate();

        logger.error(&log_args!["boom"]);

        assert_eq!(fx.writer.count(), 1);
    }

    // --- activation ---

    #[test]
    fn activation_snapshots_once() {
        let fx = fixture();
        let logger = fx.factory.logger("app", Some(LogOptions::from("warn")));
        fx.factory.activate();
        let first = logger.pristine().unwrap();

        fx.factory.activate();
        fx.factory.set_root_level(Severity::Debug);
        fx.factory.set_root_level(Severity::Trace);
        let later = logger.pristine().unwrap();

        for kind in CallKind::ALL {
            assert!(Arc::ptr_eq(first.get(kind), later.get(kind)));
            assert!(Arc::ptr_eq(first.get(kind), &logger.emitter(kind)));
        }

        logger.info(&log_args!["once"]);
        assert_eq!(fx.writer.count(), 1);
        assert_eq!(fx.sink.records().len(), 1);
    }

    #[test]
    fn set_root_level_while_inactive_only_stores() {
        let fx = fixture();
        let logger = fx.factory.logger("app", None);
        fx.factory.set_root_level(Severity::Error);

        assert!(!fx.factory.is_active());
        assert!(!logger.has_pristine());
        logger.info(&log_args!["local only"]);
        assert!(fx.sink.records().is_empty());

        fx.factory.activate();
        assert_eq!(logger.level(), Severity::Error);
    }

    #[test]
    fn loggers_created_while_active_are_wrapped() {
        let fx = fixture();
        fx.factory.activate();
        let logger = fx.factory.logger("late", Some(LogOptions::from("error")));

        logger.info(&log_args!["relayed"]);

        assert_eq!(fx.sink.records().len(), 1);
        assert_eq!(fx.factory.original_level("late"), Some(Severity::Error));
    }

    // --- deactivation ---

    #[test]
    fn deactivation_restores_emitters_and_levels() {
        let fx = fixture();
        let db = fx.factory.logger("db", Some(LogOptions::from("warn")));
        let http = fx.factory.logger("http", Some(LogOptions::from("debug")));
        fx.factory.activate();
        fx.factory.set_root_level(Severity::Error);
        let saved = [db.clone(), http.clone()].map(|logger| {
            let pristine = logger.pristine().unwrap();
            (logger, pristine)
        });

        fx.factory.deactivate();

        assert_eq!(db.level(), Severity::Warn);
        assert_eq!(http.level(), Severity::Debug);
        for (logger, pristine) in &saved {
            assert!(!logger.has_pristine());
            for kind in CallKind::ALL {
                let slot = logger.slot(kind);
                if logger.is_enabled(kind.severity()) {
                    assert!(Arc::ptr_eq(&slot, pristine.get(kind)));
                } else {
                    assert!(is_noop(&slot));
                }
            }
        }

        db.warn(&log_args!["after"]);
        http.debug(&log_args!["after"]);
        assert!(fx.sink.records().is_empty());
        assert_eq!(fx.writer.count(), 2);
    }

    #[test]
    fn root_changes_do_not_overwrite_remembered_levels() {
        let fx = fixture();
        let logger = fx.factory.logger("db", Some(LogOptions::from("error")));
        fx.factory.activate();
        fx.factory.set_root_level(Severity::Debug);
        fx.factory.set_root_level(Severity::Warn);
        assert_eq!(fx.factory.original_level("db"), Some(Severity::Error));

        fx.factory.deactivate();
        assert_eq!(logger.level(), Severity::Error);
    }

    #[test]
    fn logger_made_directly_during_session_keeps_its_level() {
        let fx = fixture();
        fx.factory.activate();
        fx.factory.facility().logger("direct", Some(&LogOptions::from("error")));

        let logger = fx.factory.logger("direct", None);
        assert_eq!(fx.factory.original_level("direct"), Some(Severity::Error));
        assert_eq!(logger.level(), Severity::Info);

        fx.factory.deactivate();
        assert_eq!(logger.level(), Severity::Error);
    }

    #[test]
    fn deactivation_is_idempotent() {
        let fx = fixture();
        let logger = fx.factory.logger("app", None);
        fx.factory.deactivate();
        assert_eq!(logger.level(), Severity::Info);

        fx.factory.activate();
        fx.factory.deactivate();
        fx.factory.deactivate();
        assert_eq!(logger.level(), Severity::Info);
        assert!(!fx.factory.is_active());
    }

    #[test]
    fn entry_point_is_the_facility_after_deactivation() {
        let fx = fixture();
        fx.factory.activate();
        fx.factory.deactivate();

        let logger = fx.factory.logger("fresh", None);
        logger.info(&log_args!["plain"]);

        assert!(!logger.has_pristine());
        assert!(fx.sink.records().is_empty());
        assert_eq!(fx.writer.count(), 1);
    }

    #[test]
    fn root_level_survives_deactivation() {
        let fx = fixture();
        let logger = fx.factory.logger("app", None);
        fx.factory.activate();
        fx.factory.set_root_level(Severity::Debug);
        fx.factory.deactivate();
        fx.factory.activate();

        assert_eq!(fx.factory.root_level(), Severity::Debug);
        assert_eq!(logger.level(), Severity::Debug);
    }
}
