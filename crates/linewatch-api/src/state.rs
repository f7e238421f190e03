//! Shared state handed to every handler.

use linewatch_core::{HealthTracker, MonitorService};
use linewatch_events::EventBus;
use linewatch_ingest::MessageBuffer;
use linewatch_telemetry::Metrics;

/// Services the HTTP surface reads from and drives.
#[derive(Clone)]
pub struct ApiDeps {
    /// Monitor owning the derived line state.
    pub monitor: MonitorService,
    /// Buffer served as the CFX batch.
    pub buffer: MessageBuffer,
    /// Metrics registry.
    pub metrics: Metrics,
    /// Degraded-component tracker.
    pub health: HealthTracker,
}

pub(crate) struct ApiState {
    pub(crate) monitor: MonitorService,
    pub(crate) buffer: MessageBuffer,
    pub(crate) telemetry: Metrics,
    pub(crate) health: HealthTracker,
}

impl ApiState {
    pub(crate) fn new(deps: ApiDeps) -> Self {
        Self {
            monitor: deps.monitor,
            buffer: deps.buffer,
            telemetry: deps.metrics,
            health: deps.health,
        }
    }

    pub(crate) fn events(&self) -> &EventBus {
        self.monitor.event_bus()
    }
}
