//! Shared monitor service: generation-gated reloads over a [`BatchSource`].
//!
//! # Design
//! - One mutex guards the session, so a reset and a dispatch never interleave.
//! - Topology changes and resets bump a generation counter. A reload applies
//!   its batch only if the generation it started under is still current.
//! - Bus publication and metrics happen after the lock is released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use linewatch_config::{LineConfig, NameCollision, Topology};
use linewatch_events::{Alert, CfxMessage, EventBus, MonitorEvent};
use linewatch_telemetry::{Metrics, dispatched};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::dispatcher::DispatchReport;
use crate::error::{MonitorError, MonitorResult};
use crate::health::{BATCH_SOURCE_COMPONENT, HealthTracker};
use crate::session::{MonitorSession, SessionLimits};
use crate::source::BatchSource;
use crate::stores::MachineEntry;

/// Result of a reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// The batch was dispatched.
    Applied(DispatchReport),
    /// The topology or session changed while fetching; the batch was discarded.
    Stale,
}

/// Dependencies of a [`MonitorService`].
pub struct MonitorDeps {
    /// Where batches come from.
    pub source: Arc<dyn BatchSource>,
    /// Bus receiving derived notifications.
    pub events: EventBus,
    /// Metrics registry.
    pub metrics: Metrics,
    /// Degraded-component tracker.
    pub health: HealthTracker,
}

struct ServiceState {
    session: MonitorSession,
    generation: u64,
    last_batch: Vec<CfxMessage>,
    last_batch_fetch: u64,
}

struct Inner {
    state: Mutex<ServiceState>,
    fetches: AtomicU64,
    source: Arc<dyn BatchSource>,
    fetch_timeout: Duration,
    events: EventBus,
    metrics: Metrics,
    health: HealthTracker,
}

/// Cloneable handle to the monitor.
#[derive(Clone)]
pub struct MonitorService {
    inner: Arc<Inner>,
}

impl MonitorService {
    /// Build a service with an installed topology.
    #[must_use]
    pub fn new(
        topology: Topology,
        limits: SessionLimits,
        fetch_timeout: Duration,
        deps: MonitorDeps,
    ) -> Self {
        let mut session = MonitorSession::new(limits);
        session.apply_topology(topology.lines);
        deps.metrics.set_tracked_lines(session.lines().len());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ServiceState {
                    session,
                    generation: 0,
                    last_batch: Vec::new(),
                    last_batch_fetch: 0,
                }),
                fetches: AtomicU64::new(0),
                source: deps.source,
                fetch_timeout,
                events: deps.events,
                metrics: deps.metrics,
                health: deps.health,
            }),
        }
    }

    /// Fetch the current batch and dispatch it.
    ///
    /// With `reset`, the session is cleared first (the explicit "reload"
    /// action). A batch fetched across a reset or topology change is returned
    /// as [`ReloadOutcome::Stale`] without touching state.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Fetch`] when the source fails and
    /// [`MonitorError::FetchTimeout`] when it does not answer in time.
    pub async fn reload(&self, reset: bool) -> MonitorResult<ReloadOutcome> {
        let started = Instant::now();
        let generation = if reset {
            self.reset()
        } else {
            self.generation()
        };
        let fetch = self.inner.fetches.fetch_add(1, Ordering::Relaxed) + 1;

        let batch = match timeout(self.inner.fetch_timeout, self.inner.source.fetch()).await {
            Ok(Ok(batch)) => batch,
            Ok(Err(source)) => {
                warn!(error = %source, "batch fetch failed");
                self.record_failure();
                return Err(MonitorError::Fetch { source });
            }
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.inner.fetch_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "batch fetch timed out");
                self.record_failure();
                return Err(MonitorError::FetchTimeout { timeout_ms });
            }
        };
        self.inner.health.mark_healthy(BATCH_SOURCE_COMPONENT);

        let outcome = {
            let mut state = self.lock();
            if state.generation == generation {
                let report = state.session.dispatch(&batch);
                // Overlapping reloads may finish out of order; keep the newest fetch.
                if fetch > state.last_batch_fetch {
                    state.last_batch = batch;
                    state.last_batch_fetch = fetch;
                }
                ReloadOutcome::Applied(report)
            } else {
                ReloadOutcome::Stale
            }
        };

        match &outcome {
            ReloadOutcome::Applied(report) => self.publish_report(report),
            ReloadOutcome::Stale => {
                info!(generation, "discarding batch fetched before a reset or topology change");
                self.inner.metrics.inc_stale_batch();
            }
        }
        self.inner.metrics.observe_reload_latency(started.elapsed());
        Ok(outcome)
    }

    /// Install a new topology and re-dispatch the last applied batch so
    /// messages from newly configured machines are picked up.
    pub fn apply_topology(&self, topology: Topology) -> Vec<NameCollision> {
        let (report, lines, collisions) = {
            let mut state = self.lock();
            state.generation = state.generation.saturating_add(1);
            let collisions = state.session.apply_topology(topology.lines).to_vec();
            let batch = std::mem::take(&mut state.last_batch);
            let report = state.session.dispatch(&batch);
            state.last_batch = batch;
            let lines: Vec<String> = state.session.line_ids().map(str::to_string).collect();
            (report, lines, collisions)
        };

        info!(
            lines = lines.len(),
            collisions = collisions.len(),
            "topology installed"
        );
        self.inner.metrics.set_tracked_lines(lines.len());
        self.inner.events.publish(MonitorEvent::TopologyChanged {
            lines,
            collisions: collisions.len(),
        });
        if report.applied > 0 {
            self.publish_report(&report);
        }
        collisions
    }

    /// Clear all derived state and return the new generation.
    pub fn reset(&self) -> u64 {
        let generation = {
            let mut state = self.lock();
            state.session.reset();
            state.last_batch.clear();
            state.generation = state.generation.saturating_add(1);
            state.generation
        };
        info!(generation, "monitor session reset");
        self.inner.events.publish(MonitorEvent::SessionReset);
        generation
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Current topology.
    #[must_use]
    pub fn lines(&self) -> Vec<LineConfig> {
        self.lock().session.lines().to_vec()
    }

    /// Current machine-name collisions.
    #[must_use]
    pub fn collisions(&self) -> Vec<NameCollision> {
        self.lock().session.collisions().to_vec()
    }

    /// Status rows of a line; `None` when the line is not configured.
    #[must_use]
    pub fn machine_states(&self, line_id: &str) -> Option<Vec<MachineEntry>> {
        self.lock().session.machine_states(line_id)
    }

    /// Event history of a line; `None` when the line is not configured.
    #[must_use]
    pub fn events(&self, line_id: &str) -> Option<Vec<CfxMessage>> {
        self.lock().session.events(line_id)
    }

    /// Alert feed of a line; `None` when the line is not configured.
    #[must_use]
    pub fn alerts(&self, line_id: &str) -> Option<Vec<Alert>> {
        self.lock().session.alerts(line_id)
    }

    /// Bus carrying monitor notifications.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.events
    }

    fn record_failure(&self) {
        self.inner.metrics.inc_reload_failure();
        self.inner.health.mark_degraded(BATCH_SOURCE_COMPONENT);
    }

    fn publish_report(&self, report: &DispatchReport) {
        let metrics = &self.inner.metrics;
        metrics.inc_batch_applied();
        metrics.add_dispatched(dispatched::APPLIED, report.applied);
        metrics.add_dispatched(dispatched::DUPLICATE, report.duplicates);
        metrics.add_dispatched(dispatched::UNROUTABLE, report.unroutable);
        metrics.add_alerts_raised(report.alerts_raised);
        debug!(
            applied = report.applied,
            duplicates = report.duplicates,
            unroutable = report.unroutable,
            status_updates = report.status_updates,
            alerts_raised = report.alerts_raised,
            "batch dispatched"
        );

        let events = &self.inner.events;
        for change in &report.status_changes {
            events.publish(MonitorEvent::StatusChanged {
                line_id: change.line_id.clone(),
                machine: change.machine.clone(),
                previous: change.previous,
                status: change.status,
                unique_id: change.unique_id.clone(),
            });
        }
        for raised in &report.alerts {
            events.publish(MonitorEvent::AlertRaised {
                line_id: raised.line_id.clone(),
                alert: raised.alert.clone(),
            });
        }
        events.publish(MonitorEvent::BatchApplied {
            applied: report.applied,
            duplicates: report.duplicates,
            unroutable: report.unroutable,
        });
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
