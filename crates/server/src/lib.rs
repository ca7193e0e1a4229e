//! Live log relay server.
//!
//! Mirrors a process's log output to WebSocket viewers while at least one is
//! attached, and lets viewers change the process-wide root level.

pub mod config;
pub mod error;
pub mod hub;
pub mod listener;
pub mod log;
pub mod metrics;
pub mod relay;

pub use config::RelayConfig;
pub use error::{BootstrapError, ConfigError, SendError};
pub use hub::{ConnectionHub, ControlOutcome, HubSink, Viewer, ViewerId};
pub use listener::{Handshake, RelayListener, bind_first, start_with_retry};
pub use log::Logging;
pub use metrics::RelayMetrics;
pub use relay::LogRelay;
