//! Owned monitor state for one data-loading session.
//!
//! # Design
//! - All derived state lives in one value so independent sessions (and tests)
//!   never share hidden globals.
//! - `reset` clears the deduplicator and every per-line store in one call.

use linewatch_config::{ALERT_CAPACITY, EVENT_CAPACITY, LineConfig, NameCollision};
use linewatch_events::{Alert, CfxMessage};

use crate::directory::MachineDirectory;
use crate::stores::{AlertFeed, Deduplicator, EventHistory, MachineEntry, MachineStatusTable};

/// Retention bounds for the per-line stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Events retained per line.
    pub event_capacity: usize,
    /// Alerts retained per line.
    pub alert_capacity: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            event_capacity: EVENT_CAPACITY,
            alert_capacity: ALERT_CAPACITY,
        }
    }
}

/// Directory, deduplicator and per-line stores for one session.
#[derive(Debug, Clone)]
pub struct MonitorSession {
    pub(crate) lines: Vec<LineConfig>,
    pub(crate) directory: MachineDirectory,
    pub(crate) dedup: Deduplicator,
    pub(crate) history: EventHistory,
    pub(crate) statuses: MachineStatusTable,
    pub(crate) alerts: AlertFeed,
}

impl MonitorSession {
    /// Create an empty session with no topology.
    #[must_use]
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            lines: Vec::new(),
            directory: MachineDirectory::default(),
            dedup: Deduplicator::default(),
            history: EventHistory::new(limits.event_capacity),
            statuses: MachineStatusTable::default(),
            alerts: AlertFeed::new(limits.alert_capacity),
        }
    }

    /// Install a topology: rebuild the directory and re-initialise every
    /// line's status table, keeping statuses already observed.
    ///
    /// Stores of lines missing from the new topology are left untouched.
    pub fn apply_topology(&mut self, lines: Vec<LineConfig>) -> &[NameCollision] {
        self.directory = MachineDirectory::build(&lines);
        for line in &lines {
            self.statuses.initialize(&line.id, line.machine_names());
        }
        self.lines = lines;
        self.directory.collisions()
    }

    /// Clear the deduplicator and all per-line stores, then start every
    /// configured machine over at `Unknown`.
    pub fn reset(&mut self) {
        self.dedup.clear();
        self.history.clear_all();
        self.statuses.clear_all();
        self.alerts.clear_all();
        for line in &self.lines {
            self.statuses.initialize(&line.id, line.machine_names());
        }
    }

    /// Current topology in configuration order.
    #[must_use]
    pub fn lines(&self) -> &[LineConfig] {
        &self.lines
    }

    /// Line ids in configuration order.
    pub fn line_ids(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.id.as_str())
    }

    /// Whether the topology contains the line.
    #[must_use]
    pub fn has_line(&self, line_id: &str) -> bool {
        self.lines.iter().any(|line| line.id == line_id)
    }

    /// Name collisions of the current directory.
    #[must_use]
    pub fn collisions(&self) -> &[NameCollision] {
        self.directory.collisions()
    }

    /// Machine status rows of a line, ordered by machine name.
    #[must_use]
    pub fn machine_states(&self, line_id: &str) -> Option<Vec<MachineEntry>> {
        if !self.has_line(line_id) {
            return None;
        }
        Some(
            self.statuses
                .get(line_id)
                .map(|line| line.values().cloned().collect())
                .unwrap_or_default(),
        )
    }

    /// Event history of a line, most-recent-first.
    #[must_use]
    pub fn events(&self, line_id: &str) -> Option<Vec<CfxMessage>> {
        self.has_line(line_id).then(|| self.history.get(line_id))
    }

    /// Alert feed of a line, most-recent-first.
    #[must_use]
    pub fn alerts(&self, line_id: &str) -> Option<Vec<Alert>> {
        self.has_line(line_id).then(|| self.alerts.get(line_id))
    }

    /// Number of message ids processed since the last reset.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.dedup.len()
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}
