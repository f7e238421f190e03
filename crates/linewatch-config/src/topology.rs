//! Topology document loading and the built-in sample lines.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{CfxEndpoint, LineConfig, MachineConfig, NameCollision};
use crate::validate::validate_topology;

/// A validated topology with its collision warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    /// Lines in configuration order.
    pub lines: Vec<LineConfig>,
    /// Machine names shared by several lines.
    pub collisions: Vec<NameCollision>,
}

impl Topology {
    /// Validate a set of lines.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTopology`] when the lines are structurally invalid.
    pub fn new(lines: Vec<LineConfig>) -> ConfigResult<Self> {
        let collisions = validate_topology(&lines)?;
        for collision in &collisions {
            warn!(
                machine = %collision.machine,
                previous_line = %collision.previous_line,
                winning_line = %collision.winning_line,
                "machine name configured on several lines; routing to the later line"
            );
        }
        Ok(Self { lines, collisions })
    }
}

/// Parse and validate a JSON `LineConfig[]` document.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::InvalidTopology`] for structurally invalid lines.
pub fn parse_topology(raw: &str) -> ConfigResult<Topology> {
    let lines: Vec<LineConfig> = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        operation: "topology.parse",
        source,
    })?;
    Topology::new(lines)
}

/// Load a topology from disk.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, plus any error of
/// [`parse_topology`].
pub fn load_topology(path: &Path) -> ConfigResult<Topology> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "topology.read",
        path: path.to_path_buf(),
        source,
    })?;
    let topology = parse_topology(&raw)?;
    info!(
        path = %path.display(),
        lines = topology.lines.len(),
        "loaded line topology"
    );
    Ok(topology)
}

/// Two identical SMT lines, used when no topology file is configured.
///
/// Both lines carry the same machine names, so routing resolves every machine
/// to `line-b` and the collision list is non-empty.
#[must_use]
pub fn sample_topology() -> Vec<LineConfig> {
    vec![sample_line("line-a", "SMT Line A"), sample_line("line-b", "SMT Line B")]
}

fn sample_line(id: &str, name: &str) -> LineConfig {
    LineConfig {
        id: id.to_string(),
        name: name.to_string(),
        machines: vec![
            station(id, "pnp1", "Pick & Place 1", "JUKI LX-8", "10.0.0.10", 120.0, &[
                ("feederCount", "8"),
                ("lane", "1"),
            ]),
            station(id, "spi", "SPI", "CyberOptics", "10.0.0.11", 420.0, &[(
                "threshold", "0.85",
            )]),
            station(id, "reflow", "Reflow", "BTU Pyramax", "10.0.0.12", 720.0, &[(
                "zones", "8",
            )]),
            station(id, "aoi", "AOI", "CyberOptics AOI", "10.0.0.13", 1020.0, &[(
                "passMark", "99.0",
            )]),
        ],
        connections: Vec::new(),
    }
}

fn station(
    line_id: &str,
    slug: &str,
    name: &str,
    kind: &str,
    host: &str,
    x: f64,
    params: &[(&str, &str)],
) -> MachineConfig {
    MachineConfig {
        id: format!("{line_id}-{slug}"),
        name: name.to_string(),
        kind: kind.to_string(),
        x,
        y: 160.0,
        image_url: None,
        cfx: Some(CfxEndpoint {
            host: host.to_string(),
            port: 1883,
            topic: format!("cfx/{line_id}/{slug}"),
        }),
        params: params
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_has_two_lines_with_shared_names() {
        let lines = sample_topology();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].machine_names().collect::<Vec<_>>(),
            vec!["Pick & Place 1", "SPI", "Reflow", "AOI"]
        );
        assert_eq!(lines[0].machines[0].params.len(), 2);
        assert_eq!(lines[1].machines[1].params.len(), 1);

        let topology = Topology::new(lines).expect("sample is valid");
        assert_eq!(topology.collisions.len(), 4);
        assert!(
            topology
                .collisions
                .iter()
                .all(|collision| collision.winning_line == "line-b")
        );
    }

    #[test]
    fn parse_reports_malformed_json() {
        assert!(matches!(
            parse_topology("{not json"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            parse_topology(r#"{"id":"a"}"#),
            Err(ConfigError::Parse { .. })
        ));
    }
}
