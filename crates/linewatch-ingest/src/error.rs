//! Error types for message ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, decoding or publishing CFX messages.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Filesystem access failed.
    #[error("mock data I/O failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A payload was not a CFX message or array of messages.
    #[error("CFX payload could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// File the payload came from, when any.
        path: Option<PathBuf>,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// The MQTT client rejected a request.
    #[error("MQTT client request failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying client error.
        #[source]
        source: rumqttc::ClientError,
    },
    /// The MQTT connection failed.
    #[error("MQTT connection failed")]
    Connection {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying connection error.
        #[source]
        source: rumqttc::ConnectionError,
    },
    /// The broker did not acknowledge every publish in time.
    #[error("MQTT publish acknowledgements timed out")]
    PublishTimeout {
        /// Messages acknowledged before the deadline.
        acknowledged: usize,
        /// Messages sent.
        expected: usize,
    },
    /// The DISCONNECT packet was not written before the deadline.
    #[error("MQTT disconnect timed out")]
    DisconnectTimeout,
}

impl IngestError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(
        operation: &'static str,
        path: Option<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Decode {
            operation,
            path,
            source,
        }
    }
}

/// Convenience alias for ingest results.
pub type IngestResult<T> = Result<T, IngestError>;
