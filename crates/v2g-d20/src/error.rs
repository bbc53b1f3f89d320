//! Errors for the fallible edges of the crate
//!
//! Protocol failures are not errors here: they travel as response codes and
//! the session's stopped flag.

use thiserror::Error;

/// Failure loading or parsing an EVSE setup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Parsed fine but the values cannot describe a usable EVSE
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
