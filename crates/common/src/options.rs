//! Logger creation options.
//!
//! A caller may request a level by name, by numeric rank, or through a
//! configuration object that optionally carries a level plus a label and
//! prefix. [`LogOptions::resolve`] collapses any of these to a [`Severity`].

use crate::severity::Severity;

/// A level given either by name or by rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSpec {
    Name(String),
    Rank(i64),
}

impl LevelSpec {
    /// Returns the matching severity, or `None` if neither the name nor the
    /// rank is recognized.
    pub fn recognize(&self) -> Option<Severity> {
        match self {
            LevelSpec::Name(name) => Severity::from_name(name).ok(),
            LevelSpec::Rank(rank) => Severity::from_rank(*rank).ok(),
        }
    }
}

impl From<Severity> for LevelSpec {
    fn from(severity: Severity) -> Self {
        LevelSpec::Name(severity.as_str().to_owned())
    }
}

/// Configuration object form of [`LogOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Option<LevelSpec>,
    pub label: Option<String>,
    pub prefix: Option<String>,
}

/// Options accepted when creating or reconfiguring a logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOptions {
    Name(String),
    Rank(i64),
    Config(LogConfig),
}

impl LogOptions {
    /// Resolves `options` to a severity.
    ///
    /// Precedence: a level name, then a numeric rank, then the `level` field of
    /// a configuration object (name or rank). Anything absent or unrecognized
    /// yields `default`.
    pub fn resolve(options: Option<&LogOptions>, default: Severity) -> Severity {
        let Some(options) = options else {
            return default;
        };
        let recognized = match options {
            LogOptions::Name(name) => Severity::from_name(name).ok(),
            LogOptions::Rank(rank) => Severity::from_rank(*rank).ok(),
            LogOptions::Config(config) => config.level.as_ref().and_then(LevelSpec::recognize),
        };
        recognized.unwrap_or(default)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            LogOptions::Config(config) => config.label.as_deref(),
            _ => None,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            LogOptions::Config(config) => config.prefix.as_deref(),
            _ => None,
        }
    }

    /// Builds a configuration object at `level` that keeps this option's label
    /// and prefix.
    pub fn with_level(options: Option<&LogOptions>, level: Severity) -> LogOptions {
        LogOptions::Config(LogConfig {
            level: Some(level.into()),
            label: options.and_then(LogOptions::label).map(str::to_owned),
            prefix: options.and_then(LogOptions::prefix).map(str::to_owned),
        })
    }
}

impl From<Severity> for LogOptions {
    fn from(severity: Severity) -> Self {
        LogOptions::Name(severity.as_str().to_owned())
    }
}

impl From<&str> for LogOptions {
    fn from(name: &str) -> Self {
        LogOptions::Name(name.to_owned())
    }
}

impl From<LogConfig> for LogOptions {
    fn from(config: LogConfig) -> Self {
        LogOptions::Config(config)
    }
}
