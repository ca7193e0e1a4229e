use std::io;

/// Failure to hand a frame to one viewer.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("viewer outbound queue is full")]
    QueueFull,

    #[error("viewer connection is closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to start relay listener on ports: {ports:?}")]
    Exhausted { ports: Vec<u16> },

    #[error("relay path {0:?} must start with '/'")]
    InvalidPath(String),

    #[error("failed to read relay listener address")]
    LocalAddr(#[source] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("{var} must be at least {min}")]
    TooSmall { var: &'static str, min: usize },
}
