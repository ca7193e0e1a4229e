//! Prometheus metrics for the log relay.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Relay counters, registered in a registry owned by this instance so that
/// several relays (and tests) can coexist in one process.
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    viewers: IntGauge,
    events_broadcast: IntCounter,
    delivery_failures: IntCounter,
    encode_failures: IntCounter,
    root_level_updates: IntCounter,
}

impl RelayMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let viewers = IntGauge::new("relay_viewers", "Number of attached log viewers")?;
        registry.register(Box::new(viewers.clone()))?;

        let events_broadcast = IntCounter::new(
            "relay_events_broadcast_total",
            "Total number of events broadcast to attached viewers",
        )?;
        registry.register(Box::new(events_broadcast.clone()))?;

        let delivery_failures = IntCounter::new(
            "relay_delivery_failures_total",
            "Total number of frames that could not be handed to a viewer",
        )?;
        registry.register(Box::new(delivery_failures.clone()))?;

        let encode_failures = IntCounter::new(
            "relay_encode_failures_total",
            "Total number of events dropped because they could not be serialized",
        )?;
        registry.register(Box::new(encode_failures.clone()))?;

        let root_level_updates = IntCounter::new(
            "relay_root_level_updates_total",
            "Total number of root level changes requested by viewers",
        )?;
        registry.register(Box::new(root_level_updates.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(Self {
            registry,
            viewers,
            events_broadcast,
            delivery_failures,
            encode_failures,
            root_level_updates,
        })
    }

    pub fn set_viewers(&self, count: usize) {
        self.viewers.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn inc_events_broadcast(&self) {
        self.events_broadcast.inc();
    }

    pub fn inc_delivery_failures(&self) {
        self.delivery_failures.inc();
    }

    pub fn inc_encode_failures(&self) {
        self.encode_failures.inc();
    }

    pub fn inc_root_level_updates(&self) {
        self.root_level_updates.inc();
    }

    pub fn viewers(&self) -> i64 {
        self.viewers.get()
    }

    pub fn events_broadcast(&self) -> u64 {
        self.events_broadcast.get()
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.get()
    }

    pub fn encode_failures(&self) -> u64 {
        self.encode_failures.get()
    }

    pub fn root_level_updates(&self) -> u64 {
        self.root_level_updates.get()
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn gather(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|error| prometheus::Error::Msg(error.to_string()))
    }
}
