//! Error types for the monitor service and its batch sources.

use std::error::Error;

use thiserror::Error;

/// Failure reported by a [`crate::BatchSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source cannot serve batches right now.
    #[error("batch source unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Human-readable detail.
        detail: String,
    },
    /// The source answered with something that is not a batch.
    #[error("batch source returned an invalid payload")]
    InvalidPayload {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying decode failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Transport or I/O failure while fetching.
    #[error("batch source request failed")]
    Failed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl SourceError {
    /// Build a [`SourceError::Failed`] from any error.
    pub fn failed(operation: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Failed {
            operation,
            source: Box::new(source),
        }
    }

    /// Build a [`SourceError::InvalidPayload`] from any decode error.
    pub fn invalid_payload(
        operation: &'static str,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidPayload {
            operation,
            source: Box::new(source),
        }
    }
}

/// Errors surfaced by [`crate::MonitorService`] reloads.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The batch could not be fetched.
    #[error("failed to fetch CFX batch")]
    Fetch {
        /// Source failure.
        #[source]
        source: SourceError,
    },
    /// The batch fetch did not finish in time.
    #[error("CFX batch fetch timed out")]
    FetchTimeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Convenience alias for monitor results.
pub type MonitorResult<T> = Result<T, MonitorError>;
