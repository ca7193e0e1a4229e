//! Named logger handles with swappable emit slots.
//!
//! A [`Logger`] is mutated in place: its six emit functions live in slots that
//! can be replaced and later restored, so every holder of the `Arc<Logger>`
//! observes interception transparently.

use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use common::{LogArg, Severity};
use parking_lot::RwLock;

use crate::facility::{LogWriter, Record};

/// One emit function.
pub type EmitFn = Arc<dyn Fn(&[LogArg]) + Send + Sync>;

static NOOP: LazyLock<EmitFn> = LazyLock::new(|| Arc::new(|_: &[LogArg]| {}) as EmitFn);

/// The shared emit function installed in disabled slots.
pub fn noop() -> EmitFn {
    NOOP.clone()
}

pub fn is_noop(emit: &EmitFn) -> bool {
    Arc::ptr_eq(emit, &NOOP)
}

/// The six severity-producing calls. `Log` and `Info` share the INFO rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Error,
    Warn,
    Info,
    Log,
    Debug,
    Trace,
}

impl CallKind {
    pub const ALL: [CallKind; 6] = [
        CallKind::Error,
        CallKind::Warn,
        CallKind::Info,
        CallKind::Log,
        CallKind::Debug,
        CallKind::Trace,
    ];

    pub fn severity(self) -> Severity {
        match self {
            CallKind::Error => Severity::Error,
            CallKind::Warn => Severity::Warn,
            CallKind::Info | CallKind::Log => Severity::Info,
            CallKind::Debug => Severity::Debug,
            CallKind::Trace => Severity::Trace,
        }
    }
}

/// A full set of emit functions, one per [`CallKind`].
#[derive(Clone)]
pub struct EmitSlots {
    error: EmitFn,
    warn: EmitFn,
    info: EmitFn,
    log: EmitFn,
    debug: EmitFn,
    trace: EmitFn,
}

impl EmitSlots {
    pub fn from_fn(mut make: impl FnMut(CallKind) -> EmitFn) -> Self {
        Self {
            error: make(CallKind::Error),
            warn: make(CallKind::Warn),
            info: make(CallKind::Info),
            log: make(CallKind::Log),
            debug: make(CallKind::Debug),
            trace: make(CallKind::Trace),
        }
    }

    pub fn get(&self, kind: CallKind) -> &EmitFn {
        match kind {
            CallKind::Error => &self.error,
            CallKind::Warn => &self.warn,
            CallKind::Info => &self.info,
            CallKind::Log => &self.log,
            CallKind::Debug => &self.debug,
            CallKind::Trace => &self.trace,
        }
    }

    /// Keeps `source`'s function for every kind `threshold` permits and the
    /// shared no-op for the rest.
    pub fn gated(source: &EmitSlots, threshold: Severity) -> Self {
        Self::from_fn(|kind| {
            if Severity::permits(threshold, kind.severity()) {
                source.get(kind).clone()
            } else {
                noop()
            }
        })
    }
}

impl fmt::Debug for EmitSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitSlots").finish_non_exhaustive()
    }
}

/// Convenience flags mirroring which severities are currently emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledFlags {
    pub error: bool,
    pub warn: bool,
    pub info: bool,
    pub debug: bool,
    pub trace: bool,
}

impl EnabledFlags {
    pub fn at(threshold: Severity) -> Self {
        let permits = |severity| Severity::permits(threshold, severity);
        Self {
            error: permits(Severity::Error),
            warn: permits(Severity::Warn),
            info: permits(Severity::Info),
            debug: permits(Severity::Debug),
            trace: permits(Severity::Trace),
        }
    }

    pub fn get(&self, severity: Severity) -> bool {
        match severity {
            Severity::Silent => false,
            Severity::Error => self.error,
            Severity::Warn => self.warn,
            Severity::Info => self.info,
            Severity::Debug => self.debug,
            Severity::Trace => self.trace,
        }
    }
}

struct LoggerState {
    level: Severity,
    slots: EmitSlots,
    enabled: EnabledFlags,
    /// Emit functions saved on first interception, present only while
    /// interception is active.
    pristine: Option<EmitSlots>,
}

/// A named logger owned by the [`crate::LogFacility`].
pub struct Logger {
    id: Arc<str>,
    label: Arc<str>,
    prefix: Option<Arc<str>>,
    /// Real emitters, created once. Level changes select among these and the
    /// no-op, so slot identity is stable across reconfiguration.
    emitters: EmitSlots,
    state: RwLock<LoggerState>,
}

impl Logger {
    pub(crate) fn new(
        id: &str,
        label: Option<&str>,
        prefix: Option<&str>,
        writer: Arc<dyn LogWriter>,
        level: Severity,
    ) -> Self {
        let id: Arc<str> = Arc::from(id);
        let label: Arc<str> = label.map(Arc::from).unwrap_or_else(|| id.clone());
        let prefix: Option<Arc<str>> = prefix.map(Arc::from);

        let emitters = EmitSlots::from_fn(|kind| {
            let writer = writer.clone();
            let id = id.clone();
            let label = label.clone();
            let prefix = prefix.clone();
            let severity = kind.severity();
            let emit: EmitFn = Arc::new(move |args: &[LogArg]| {
                writer.write(&Record {
                    logger: &id,
                    label: &label,
                    prefix: prefix.as_deref(),
                    severity,
                    args,
                });
            });
            emit
        });

        let state = LoggerState {
            level,
            slots: EmitSlots::gated(&emitters, level),
            enabled: EnabledFlags::at(level),
            pristine: None,
        };
        Self { id, label, prefix, emitters, state: RwLock::new(state) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The level currently applied to this logger.
    pub fn level(&self) -> Severity {
        self.state.read().level
    }

    pub fn enabled(&self) -> EnabledFlags {
        self.state.read().enabled
    }

    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.state.read().enabled.get(severity)
    }

    /// The function currently installed for `kind`.
    pub fn slot(&self, kind: CallKind) -> EmitFn {
        self.state.read().slots.get(kind).clone()
    }

    /// The facility's own emitter for `kind`, regardless of level.
    pub fn emitter(&self, kind: CallKind) -> EmitFn {
        self.emitters.get(kind).clone()
    }

    /// Calls the function installed for `kind`. The slot lock is released
    /// before the call.
    pub fn emit(&self, kind: CallKind, args: &[LogArg]) {
        let emit = self.slot(kind);
        emit(args);
    }

    pub fn error(&self, args: &[LogArg]) {
        self.emit(CallKind::Error, args);
    }

    pub fn warn(&self, args: &[LogArg]) {
        self.emit(CallKind::Warn, args);
    }

    pub fn info(&self, args: &[LogArg]) {
        self.emit(CallKind::Info, args);
    }

    pub fn log(&self, args: &[LogArg]) {
        self.emit(CallKind::Log, args);
    }

    pub fn debug(&self, args: &[LogArg]) {
        self.emit(CallKind::Debug, args);
    }

    pub fn trace(&self, args: &[LogArg]) {
        self.emit(CallKind::Trace, args);
    }

    /// Applies `level` using the real emitters.
    pub(crate) fn configure(&self, level: Severity) {
        let mut state = self.state.write();
        state.slots = EmitSlots::gated(&self.emitters, level);
        state.enabled = EnabledFlags::at(level);
        state.level = level;
    }

    /// Installs externally built slots and the level they correspond to.
    pub(crate) fn install(&self, slots: EmitSlots, level: Severity) {
        let mut state = self.state.write();
        state.slots = slots;
        state.enabled = EnabledFlags::at(level);
        state.level = level;
    }

    /// Returns the saved pristine slots, capturing the current slots first if
    /// nothing is saved yet. An existing snapshot is never overwritten.
    pub(crate) fn pristine_or_snapshot(&self) -> EmitSlots {
        let mut state = self.state.write();
        match &state.pristine {
            Some(pristine) => pristine.clone(),
            None => {
                let snapshot = state.slots.clone();
                state.pristine = Some(snapshot.clone());
                snapshot
            }
        }
    }

    /// Writes the saved pristine slots back and discards the snapshot.
    /// Returns false if nothing was saved.
    pub(crate) fn restore_pristine(&self) -> bool {
        let mut state = self.state.write();
        match state.pristine.take() {
            Some(pristine) => {
                state.slots = pristine;
                true
            }
            None => false,
        }
    }

    pub fn pristine(&self) -> Option<EmitSlots> {
        self.state.read().pristine.clone()
    }

    pub fn has_pristine(&self) -> bool {
        self.state.read().pristine.is_some()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Logger")
            .field("id", &self.id)
            .field("level", &state.level)
            .field("intercepted", &state.pristine.is_some())
            .finish()
    }
}
