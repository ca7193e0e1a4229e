use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

const DEFAULT_LEVEL: &str = "info";

/// Logging configuration and initialization.
#[derive(Debug, Default)]
pub struct Logging {
    directives: Option<String>,
}

impl Logging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `directives` instead of `RUST_LOG`.
    pub fn with_directives(directives: impl Into<String>) -> Self {
        Self { directives: Some(directives.into()) }
    }

    /// Initializes the tracing subscriber (fmt + EnvFilter).
    /// Log level is controlled by `RUST_LOG`; if unset or invalid, defaults to INFO.
    /// Panics if a global subscriber is already installed.
    pub fn early_init(self) {
        tracing_subscriber::registry().with(fmt::layer()).with(self.filter()).init();
    }

    /// Like [`Logging::early_init`], but returns an error instead of panicking
    /// when a subscriber is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry().with(fmt::layer()).with(self.filter()).try_init()
    }

    fn filter(&self) -> EnvFilter {
        match &self.directives {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
            }
            None => {
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
            }
        }
    }
}
