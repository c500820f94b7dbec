//! Error types for the reset engine.
//!
//! None of these abort a reconciliation pass. Load and config failures fall
//! back to empty state or defaults, save failures keep the registry dirty, and
//! reset failures leave the entry for the next pass.

use std::path::PathBuf;

/// Error reading or writing tracked state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("state file {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file could not be encoded or decoded.
    #[error("state file {path} is not valid: {source}")]
    Serialization {
        /// File being read or written.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory store was told to fail.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}

/// Error raised by the host while clearing or regenerating a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetError {
    /// The host API rejected the operation.
    #[error("host rejected reset: {0}")]
    Host(String),
}

impl ResetError {
    /// Creates a host error.
    pub fn host(reason: impl Into<String>) -> Self {
        Self::Host(reason.into())
    }
}

/// Error resolving settings into an engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings file could not be read or written.
    #[error("settings file {path}: {source}")]
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not well-formed.
    #[error("settings file {path} could not be parsed: {reason}")]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A setting holds a value outside its domain.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid_value(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_the_file() {
        let err = StoreError::io(
            "/saves/world/restock_state.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("restock_state.json"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = ConfigError::invalid_value("reset_time_value", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid value for 'reset_time_value': must be greater than 0"
        );
    }
}
