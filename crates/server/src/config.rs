//! Relay listener configuration.

use std::{
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};

use protocol::{RELAY_PATH, WELCOME_MESSAGE};
use rand::Rng;

use crate::error::ConfigError;

/// First port tried by the listener.
pub const DEFAULT_PORT: u16 = 54953;

/// Number of random fallback ports tried after [`DEFAULT_PORT`].
pub const DEFAULT_RANDOM_PORTS: usize = 10;

/// Lower bound (inclusive) of random fallback ports.
pub const MIN_RANDOM_PORT: u16 = 1024;

/// Upper bound (exclusive) of random fallback ports.
pub const MAX_RANDOM_PORT: u16 = 65535;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

pub const ENV_HOST: &str = "LOG_RELAY_HOST";
pub const ENV_PORT: &str = "LOG_RELAY_PORT";
pub const ENV_RANDOM_PORTS: &str = "LOG_RELAY_RANDOM_PORTS";
pub const ENV_QUEUE: &str = "LOG_RELAY_QUEUE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address to bind to.
    pub host: IpAddr,
    /// Candidate ports, tried in order.
    pub ports: Vec<u16>,
    /// Path viewers connect on. Also stamped into every frame.
    pub path: String,
    /// Text of the greeting sent to each new viewer.
    pub welcome_message: String,
    /// Outbound frames buffered per viewer before sends start failing.
    pub queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ports: candidate_ports(DEFAULT_PORT, DEFAULT_RANDOM_PORTS),
            path: RELAY_PATH.to_owned(),
            welcome_message: WELCOME_MESSAGE.to_owned(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by the `LOG_RELAY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`RelayConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = parse_var(&lookup, ENV_HOST)? {
            config.host = host;
        }

        let port = parse_var(&lookup, ENV_PORT)?.unwrap_or(DEFAULT_PORT);
        let random = parse_var(&lookup, ENV_RANDOM_PORTS)?.unwrap_or(DEFAULT_RANDOM_PORTS);
        config.ports = candidate_ports(port, random);

        if let Some(capacity) = parse_var(&lookup, ENV_QUEUE)? {
            if capacity == 0 {
                return Err(ConfigError::TooSmall { var: ENV_QUEUE, min: 1 });
            }
            config.queue_capacity = capacity;
        }

        Ok(config)
    }
}

/// `first` followed by `random` ports drawn from
/// [`MIN_RANDOM_PORT`]..[`MAX_RANDOM_PORT`].
pub fn candidate_ports(first: u16, random: usize) -> Vec<u16> {
    let mut rng = rand::thread_rng();
    std::iter::once(first)
        .chain((0..random).map(|_| rng.gen_range(MIN_RANDOM_PORT..MAX_RANDOM_PORT)))
        .collect()
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::Invalid { var, value: value.to_owned() }),
    }
}
