//! Configuration error types.

use std::fmt;

/// Error type for configuration loading and resolution.
///
/// Every variant is fatal to pool construction: the pool is never created
/// from a configuration that produced one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to parse environment variable.
    Parse {
        key: String,
        value: String,
        error: String,
    },
    /// Invalid value (out of the allowed set, or inconsistent with another key).
    Invalid { key: String, message: String },
    /// A named extension was not found in the registry.
    MissingExtension { key: String, name: String },
    /// A named extension exists but does not provide the required capability.
    CapabilityMismatch {
        key: String,
        name: String,
        expected: &'static str,
    },
}

impl ConfigError {
    /// Every configuration error makes the configuration invalid.
    pub fn is_invalid_configuration(&self) -> bool {
        true
    }

    /// The configuration key this error refers to.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::Parse { key, .. }
            | ConfigError::Invalid { key, .. }
            | ConfigError::MissingExtension { key, .. }
            | ConfigError::CapabilityMismatch { key, .. } => key,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { key, value, error } => {
                write!(f, "failed to parse {}='{}': {}", key, value, error)
            }
            ConfigError::Invalid { key, message } => {
                write!(f, "invalid value for {}: {}", key, message)
            }
            ConfigError::MissingExtension { key, name } => {
                write!(f, "no extension named '{}' is registered (from {})", name, key)
            }
            ConfigError::CapabilityMismatch {
                key,
                name,
                expected,
            } => {
                write!(
                    f,
                    "extension '{}' (from {}) is not a {}",
                    name, key, expected
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
