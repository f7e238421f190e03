//! Monitor event payloads carried on the bus.

use chrono::{DateTime, Utc};

use crate::alert::Alert;
use crate::status::MachineStatus;

/// Identifier assigned to each event emitted by the monitor.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed monitor events surfaced to subscribers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A machine on a line moved to a different status.
    StatusChanged {
        /// Line that owns the machine.
        line_id: String,
        /// Machine name as reported in `Source`.
        machine: String,
        /// Status before the update.
        previous: MachineStatus,
        /// Status after the update.
        status: MachineStatus,
        /// `UniqueID` of the message that caused the change.
        unique_id: String,
    },
    /// A new alert was appended to a line's feed.
    AlertRaised {
        /// Line that received the alert.
        line_id: String,
        /// The alert itself.
        alert: Alert,
    },
    /// A batch finished dispatching.
    BatchApplied {
        /// Messages that were routed and recorded.
        applied: usize,
        /// Messages skipped because their id had already been seen.
        duplicates: usize,
        /// Messages whose source matched no configured machine.
        unroutable: usize,
    },
    /// All derived state was cleared.
    SessionReset,
    /// A new line topology was installed.
    TopologyChanged {
        /// Line ids in the new topology, in configuration order.
        lines: Vec<String>,
        /// Number of machine names claimed by more than one line.
        collisions: usize,
    },
    /// System health status changed (degraded or restored components).
    HealthChanged {
        /// Components currently considered degraded.
        degraded: Vec<String>,
    },
}

impl MonitorEvent {
    /// Machine-friendly discriminator for SSE consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::AlertRaised { .. } => "alert_raised",
            Self::BatchApplied { .. } => "batch_applied",
            Self::SessionReset => "session_reset",
            Self::TopologyChanged { .. } => "topology_changed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }

    /// Line the event is scoped to, if any.
    #[must_use]
    pub fn line_id(&self) -> Option<&str> {
        match self {
            Self::StatusChanged { line_id, .. } | Self::AlertRaised { line_id, .. } => {
                Some(line_id)
            }
            _ => None,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned to the wrapped event.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: MonitorEvent,
}
