//! Bounded in-memory buffer of received CFX messages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use linewatch_core::{BatchSource, SourceError};
use linewatch_events::CfxMessage;
use linewatch_telemetry::Metrics;

/// FIFO of decoded messages; the oldest message is evicted on overflow.
///
/// The whole buffered set is served as the batch, so clones share state.
#[derive(Clone)]
pub struct MessageBuffer {
    messages: Arc<Mutex<VecDeque<CfxMessage>>>,
    capacity: usize,
    metrics: Option<Metrics>,
}

impl MessageBuffer {
    /// Create an empty buffer holding at most `capacity` messages (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            metrics: None,
        }
    }

    /// Report the buffer depth through the given registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        metrics.set_buffered_messages(self.len());
        self.metrics = Some(metrics);
        self
    }

    /// Append one message.
    pub fn push(&self, message: CfxMessage) {
        self.extend([message]);
    }

    /// Append messages in order.
    pub fn extend(&self, messages: impl IntoIterator<Item = CfxMessage>) {
        let mut guard = self.lock();
        for message in messages {
            if guard.len() == self.capacity {
                let _ = guard.pop_front();
            }
            guard.push_back(message);
        }
        let len = guard.len();
        drop(guard);
        self.report(len);
    }

    /// Copy of every buffered message, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CfxMessage> {
        self.lock().iter().cloned().collect()
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Configured bound.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every buffered message.
    pub fn clear(&self) {
        self.lock().clear();
        self.report(0);
    }

    fn report(&self, len: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.set_buffered_messages(len);
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CfxMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BatchSource for MessageBuffer {
    async fn fetch(&self) -> Result<Vec<CfxMessage>, SourceError> {
        Ok(self.snapshot())
    }
}
