//! Degraded-component tracking shared by the monitor, ingest and API.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use linewatch_events::{EventBus, MonitorEvent};
use tracing::{info, warn};

/// Component name used while batch fetches fail.
pub const BATCH_SOURCE_COMPONENT: &str = "batch_source";
/// Component name used while the broker connection is down.
pub const BROKER_COMPONENT: &str = "broker";

/// Sorted set of degraded components; every change is published as
/// [`MonitorEvent::HealthChanged`].
#[derive(Clone)]
pub struct HealthTracker {
    degraded: Arc<Mutex<Vec<String>>>,
    events: EventBus,
}

impl HealthTracker {
    /// Create a tracker with nothing degraded.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            degraded: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    /// Mark a component degraded. Returns whether the set changed.
    pub fn mark_degraded(&self, component: &str) -> bool {
        let mut guard = self.lock();
        if guard.iter().any(|entry| entry == component) {
            return false;
        }
        guard.push(component.to_string());
        guard.sort();
        let snapshot = guard.clone();
        drop(guard);
        warn!(component, "component degraded");
        self.events
            .publish(MonitorEvent::HealthChanged { degraded: snapshot });
        true
    }

    /// Clear a component's degraded flag. Returns whether the set changed.
    pub fn mark_healthy(&self, component: &str) -> bool {
        let mut guard = self.lock();
        let previous = guard.len();
        guard.retain(|entry| entry != component);
        if guard.len() == previous {
            return false;
        }
        let snapshot = guard.clone();
        drop(guard);
        info!(component, "component recovered");
        self.events
            .publish(MonitorEvent::HealthChanged { degraded: snapshot });
        true
    }

    /// Currently degraded components, sorted.
    #[must_use]
    pub fn degraded(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.degraded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_are_published_once() {
        let events = EventBus::with_capacity(8);
        let health = HealthTracker::new(events.clone());

        assert!(health.mark_degraded(BROKER_COMPONENT));
        assert!(!health.mark_degraded(BROKER_COMPONENT));
        assert!(health.mark_degraded(BATCH_SOURCE_COMPONENT));
        assert_eq!(health.degraded(), vec!["batch_source", "broker"]);

        assert!(health.mark_healthy(BROKER_COMPONENT));
        assert!(!health.mark_healthy(BROKER_COMPONENT));
        assert_eq!(events.last_event_id(), Some(3));

        let backlog = events.backlog_since(0);
        assert_eq!(
            backlog.last().map(|envelope| envelope.event.clone()),
            Some(MonitorEvent::HealthChanged {
                degraded: vec!["batch_source".to_string()],
            })
        );
    }
}
