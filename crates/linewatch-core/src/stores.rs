//! Derived per-line stores: event history, machine status table, alert feed,
//! and the process-wide deduplicator.

use std::collections::{BTreeMap, HashMap, HashSet};

use linewatch_events::{Alert, CfxMessage, MachineStatus};
use serde::{Deserialize, Serialize};

use crate::feed::LineFeed;

/// Set of `UniqueID`s already processed in the current session.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    /// Whether the id was processed before.
    #[must_use]
    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id as processed.
    pub fn mark_seen(&mut self, id: &str) {
        if !self.seen.contains(id) {
            self.seen.insert(id.to_string());
        }
    }

    /// Number of processed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been processed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget every processed id.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// Raw CFX messages per line, most-recent-first.
pub type EventHistory = LineFeed<CfxMessage>;

/// One row of a line's status table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineEntry {
    /// Machine name.
    pub name: String,
    /// Latest classified status.
    pub status: MachineStatus,
    /// Efficiency figure; carried through unchanged, never derived here.
    pub efficiency: f64,
}

impl MachineEntry {
    fn unknown(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: MachineStatus::Unknown,
            efficiency: 0.0,
        }
    }
}

/// Per-line machine status maps.
#[derive(Debug, Clone, Default)]
pub struct MachineStatusTable {
    lines: HashMap<String, BTreeMap<String, MachineEntry>>,
}

impl MachineStatusTable {
    /// Replace a line's machine set. Machines already present keep their
    /// entry; new machines start at `Unknown`; machines no longer listed are dropped.
    pub fn initialize<'a>(
        &mut self,
        line_id: &str,
        machine_names: impl IntoIterator<Item = &'a str>,
    ) {
        let previous = self.lines.remove(line_id).unwrap_or_default();
        let merged = machine_names
            .into_iter()
            .map(|name| {
                let entry = previous
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| MachineEntry::unknown(name));
                (name.to_string(), entry)
            })
            .collect();
        self.lines.insert(line_id.to_string(), merged);
    }

    /// Overwrite a machine's status and return the previous one.
    ///
    /// Returns `None` (and changes nothing) when the line or machine has no entry.
    pub fn update_status(
        &mut self,
        line_id: &str,
        machine: &str,
        status: MachineStatus,
    ) -> Option<MachineStatus> {
        let entry = self.lines.get_mut(line_id)?.get_mut(machine)?;
        Some(std::mem::replace(&mut entry.status, status))
    }

    /// Status map of a line, ordered by machine name.
    #[must_use]
    pub fn get(&self, line_id: &str) -> Option<&BTreeMap<String, MachineEntry>> {
        self.lines.get(line_id)
    }

    /// Drop every line.
    pub fn clear_all(&mut self) {
        self.lines.clear();
    }
}

/// Alerts per line, most-recent-first, appended at most once per id.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    feed: LineFeed<Alert>,
    appended: HashSet<String>,
}

impl AlertFeed {
    /// Create an empty feed retaining at most `capacity` alerts per line.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            feed: LineFeed::new(capacity),
            appended: HashSet::new(),
        }
    }

    /// Prepend an alert unless one with the same id was appended before.
    /// Returns whether the alert was added.
    pub fn append(&mut self, line_id: &str, alert: Alert) -> bool {
        if !self.appended.insert(alert.id.clone()) {
            return false;
        }
        self.feed.append(line_id, alert);
        true
    }

    /// Alerts for a line, most-recent-first.
    #[must_use]
    pub fn get(&self, line_id: &str) -> Vec<Alert> {
        self.feed.get(line_id)
    }

    /// Drop every alert and forget appended ids.
    pub fn clear_all(&mut self) {
        self.feed.clear_all();
        self.appended.clear();
    }
}
