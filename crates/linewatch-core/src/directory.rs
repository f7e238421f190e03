//! Machine name to line routing.

use std::collections::HashMap;

use linewatch_config::{LineConfig, NameCollision, find_collisions};
use tracing::warn;

/// Lookup from machine name (CFX `Source`) to owning line id.
#[derive(Debug, Clone, Default)]
pub struct MachineDirectory {
    routes: HashMap<String, String>,
    collisions: Vec<NameCollision>,
}

impl MachineDirectory {
    /// Flatten every line's machines into one lookup.
    ///
    /// When several lines list the same machine name the later line wins;
    /// each override is recorded as a [`NameCollision`] and logged.
    #[must_use]
    pub fn build(lines: &[LineConfig]) -> Self {
        let routes = lines
            .iter()
            .flat_map(|line| {
                line.machine_names()
                    .map(move |name| (name.to_string(), line.id.clone()))
            })
            .collect();
        let collisions = find_collisions(lines);
        for collision in &collisions {
            warn!(
                machine = %collision.machine,
                previous_line = %collision.previous_line,
                winning_line = %collision.winning_line,
                "machine name routed to the later of several lines"
            );
        }
        Self { routes, collisions }
    }

    /// Line owning the machine, if any.
    #[must_use]
    pub fn get(&self, machine: &str) -> Option<&str> {
        self.routes.get(machine).map(String::as_str)
    }

    /// Name collisions found while building.
    #[must_use]
    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// Number of routable machine names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no machine is routable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
