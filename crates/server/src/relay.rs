//! Wiring of facility, factory, hub and listener.

use std::sync::Arc;

use common::LogOptions;
use intercept::{InterceptingLoggerFactory, LogFacility, Logger};

use crate::{
    config::RelayConfig,
    error::BootstrapError,
    hub::{ConnectionHub, HubSink},
    listener::{RelayListener, start_with_retry},
    metrics::RelayMetrics,
};

/// A log relay attached to one [`LogFacility`].
///
/// The host creates its loggers through [`LogRelay::logger`] and calls
/// [`LogRelay::start`] once to begin accepting viewers.
pub struct LogRelay {
    factory: Arc<InterceptingLoggerFactory>,
    hub: Arc<ConnectionHub>,
    config: RelayConfig,
}

impl LogRelay {
    pub fn new(facility: Arc<LogFacility>, config: RelayConfig) -> prometheus::Result<Self> {
        let metrics = RelayMetrics::new()?;
        let sink = Arc::new(HubSink::new());
        let factory = Arc::new(
            InterceptingLoggerFactory::new(facility, sink.clone()).with_path(config.path.clone()),
        );
        let hub = Arc::new(ConnectionHub::new(factory.clone(), metrics));
        sink.bind(&hub);
        Ok(Self { factory, hub, config })
    }

    /// Logger-creation entry point for the host process.
    pub fn logger(&self, id: &str, options: Option<LogOptions>) -> Arc<Logger> {
        self.factory.logger(id, options)
    }

    pub fn factory(&self) -> &Arc<InterceptingLoggerFactory> {
        &self.factory
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub async fn start(&self) -> Result<RelayListener, BootstrapError> {
        start_with_retry(&self.config, self.hub.clone()).await
    }
}
