//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Variable or field name that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A topology document was structurally invalid.
    #[error("invalid topology")]
    InvalidTopology {
        /// Line id (or position) where the problem was found.
        line: String,
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A topology document could not be parsed.
    #[error("failed to parse topology document")]
    Parse {
        /// Operation identifier.
        operation: &'static str,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_field(
        field: impl Into<String>,
        value: Option<&str>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.map(str::to_string),
            reason,
        }
    }

    pub(crate) fn invalid_topology(
        line: impl Into<String>,
        field: &'static str,
        reason: &'static str,
    ) -> Self {
        Self::InvalidTopology {
            line: line.into(),
            field,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
