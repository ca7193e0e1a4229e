use protocol::Envelope;

/// Error returned by a [`RelaySink`] that could not accept an event.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("relay sink is closed")]
    Closed,

    #[error("relay sink rejected the event: {0}")]
    Rejected(String),
}

/// Receives every event produced by a relay wrapper.
///
/// Called synchronously on the logging thread, so implementations must not
/// block.
pub trait RelaySink: Send + Sync {
    fn publish(&self, envelope: Envelope) -> Result<(), SinkError>;
}
