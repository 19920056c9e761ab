//! Core error types for interval-core.
//!
//! The timer itself barely fails: `start`, `pause` and `reset` are total, and
//! bad durations are clamped. What remains is the locked-config rejection, the
//! config file layer, and the async runner's channel going away.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for interval-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// `reconfigure` was called while the timer was running
    #[error("session config is locked while the timer is running")]
    ConfigLocked,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The runner task has stopped and no longer accepts commands
    #[error("timer runner has shut down")]
    RunnerClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse a value for a key
    #[error("cannot parse '{value}' for '{key}': {message}")]
    ParseFailed {
        key: String,
        value: String,
        message: String,
    },

    #[error("could not determine a configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_core_error() {
        let err: CoreError = ValidationError::InvalidValue {
            field: "work_secs".into(),
            message: "must be at least 1".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("work_secs"));
    }

    #[test]
    fn config_locked_message() {
        assert_eq!(
            CoreError::ConfigLocked.to_string(),
            "session config is locked while the timer is running"
        );
    }
}
