//! Connection hub.
//!
//! Owns the set of attached viewers and decides when interception runs: the
//! first attach activates it and the last detach deactivates it. Inbound
//! control frames set the root level; outbound events are encoded once and
//! fanned out to every viewer.

use std::{
    fmt,
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use intercept::{InterceptionControl, RelaySink, SinkError};
use parking_lot::Mutex;
use protocol::{Envelope, LoggingUpdate, ServerCodec, error::DecodeError};
use tracing::{debug, info, warn};

use crate::{error::SendError, metrics::RelayMetrics};

/// One attached connection, as seen by the hub.
pub trait Viewer: Send + Sync {
    /// Queues a text frame. Must not block.
    fn send(&self, frame: &Utf8Bytes) -> Result<(), SendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Result of a well-formed control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// At least one root directive was applied.
    Applied { root_updates: usize },
    /// Not a known command, or no root directive.
    Ignored,
}

pub struct ConnectionHub {
    control: Arc<dyn InterceptionControl>,
    viewers: DashMap<ViewerId, Arc<dyn Viewer>>,
    /// Serializes membership changes with activate/deactivate.
    transitions: Mutex<()>,
    next_id: AtomicU64,
    metrics: RelayMetrics,
}

impl ConnectionHub {
    pub fn new(control: Arc<dyn InterceptionControl>, metrics: RelayMetrics) -> Self {
        Self {
            control,
            viewers: DashMap::new(),
            transitions: Mutex::new(()),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    pub fn attach(&self, viewer: Arc<dyn Viewer>) -> ViewerId {
        let _transition = self.transitions.lock();
        let id = ViewerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let first = self.viewers.is_empty();
        self.viewers.insert(id, viewer);
        self.metrics.set_viewers(self.viewers.len());

        if first {
            info!(viewer = %id, "first viewer attached");
            self.control.activate();
        } else {
            debug!(viewer = %id, viewers = self.viewers.len(), "viewer attached");
        }
        id
    }

    /// Removes a viewer. Returns false if it was not attached.
    pub fn detach(&self, id: ViewerId) -> bool {
        let _transition = self.transitions.lock();
        if self.viewers.remove(&id).is_none() {
            return false;
        }
        self.metrics.set_viewers(self.viewers.len());

        if self.viewers.is_empty() {
            info!(viewer = %id, "last viewer detached");
            self.control.deactivate();
        } else {
            debug!(viewer = %id, viewers = self.viewers.len(), "viewer detached");
        }
        true
    }

    /// Applies an inbound text frame.
    ///
    /// Text that is not JSON is an error. Anything else that is not a valid
    /// `logging/update` command, and directives for loggers other than the
    /// root, are ignored.
    pub fn handle_message(&self, text: &str) -> Result<ControlOutcome, DecodeError> {
        let update = ServerCodec.decode(text)?;
        Ok(self.apply(update))
    }

    /// Same as [`ConnectionHub::handle_message`] for a binary frame.
    pub fn handle_bytes(&self, bytes: &[u8]) -> Result<ControlOutcome, DecodeError> {
        let update = ServerCodec.decode_bytes(bytes)?;
        Ok(self.apply(update))
    }

    fn apply(&self, update: Option<LoggingUpdate>) -> ControlOutcome {
        let Some(update) = update else {
            debug!("ignoring control frame with unknown shape");
            return ControlOutcome::Ignored;
        };

        let mut root_updates = 0;
        for level in update.root_levels() {
            info!(root = %level, "viewer changed root level");
            self.control.set_root_level(level);
            self.metrics.inc_root_level_updates();
            root_updates += 1;
        }

        match root_updates {
            0 => ControlOutcome::Ignored,
            root_updates => ControlOutcome::Applied { root_updates },
        }
    }

    /// Encodes `envelope` once and hands it to every attached viewer.
    ///
    /// Returns the number of viewers that accepted the frame. An event that
    /// cannot be encoded is dropped for everyone.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        if self.viewers.is_empty() {
            return 0;
        }

        let frame = match ServerCodec.encode(envelope) {
            Ok(text) => Utf8Bytes::from(text),
            Err(error) => {
                warn!(%error, "failed to serialize log event");
                self.metrics.inc_encode_failures();
                return 0;
            }
        };

        let viewers: Vec<(ViewerId, Arc<dyn Viewer>)> =
            self.viewers.iter().map(|entry| (*entry.key(), entry.value().clone())).collect();

        let mut delivered = 0;
        for (id, viewer) in viewers {
            match viewer.send(&frame) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    warn!(viewer = %id, %error, "failed to deliver log event");
                    self.metrics.inc_delivery_failures();
                }
            }
        }
        self.metrics.inc_events_broadcast();
        delivered
    }
}

/// [`RelaySink`] that publishes into a [`ConnectionHub`].
///
/// Holds the hub weakly, so the hub may own the factory that owns this sink.
/// Publishing before [`HubSink::bind`] or after the hub is dropped fails with
/// [`SinkError::Closed`].
#[derive(Default)]
pub struct HubSink {
    hub: OnceLock<Weak<ConnectionHub>>,
}

impl HubSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the sink at `hub`. Only the first call has an effect.
    pub fn bind(&self, hub: &Arc<ConnectionHub>) -> bool {
        self.hub.set(Arc::downgrade(hub)).is_ok()
    }
}

impl RelaySink for HubSink {
    fn publish(&self, envelope: Envelope) -> Result<(), SinkError> {
        let hub = self.hub.get().and_then(Weak::upgrade).ok_or(SinkError::Closed)?;
        hub.broadcast(&envelope);
        Ok(())
    }
}
