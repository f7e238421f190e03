//! Batch sources feeding the monitor.

use async_trait::async_trait;
use linewatch_events::CfxMessage;

use crate::error::SourceError;

/// Supplies the current batch of CFX messages.
///
/// A batch is the whole buffered set, not a delta; the deduplicator makes
/// repeated delivery harmless.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Fetch the current batch in array order.
    async fn fetch(&self) -> Result<Vec<CfxMessage>, SourceError>;
}
