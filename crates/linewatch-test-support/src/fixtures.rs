//! Topology fixtures.

use linewatch_config::{LineConfig, MachineConfig, Topology};

/// A line whose machines carry only names.
#[must_use]
pub fn line(id: &str, machines: &[&str]) -> LineConfig {
    LineConfig {
        id: id.to_string(),
        name: format!("Line {id}"),
        machines: machines.iter().map(|name| MachineConfig::named(*name)).collect(),
        connections: Vec::new(),
    }
}

/// Validated topology from the given lines.
///
/// # Panics
///
/// Panics when the lines do not form a valid topology.
#[must_use]
pub fn topology(lines: Vec<LineConfig>) -> Topology {
    match Topology::new(lines) {
        Ok(topology) => topology,
        Err(err) => panic!("fixture topology is invalid: {err}"),
    }
}

/// Two lines with disjoint machines: `line-A` (`SPI`, `Reflow`) and
/// `line-B` (`AOI`).
#[must_use]
pub fn two_lines() -> Topology {
    topology(vec![line("line-A", &["SPI", "Reflow"]), line("line-B", &["AOI"])])
}
