//! Typed line topology models.
//!
//! Field names follow the JSON documents produced by the line configuration
//! editor (`imageUrl`, `fromId`, ...), so topology files can be exported from
//! it unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One configured production line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineConfig {
    /// Stable line identifier; the partition key for all per-line state.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Machines on the line in flow order.
    #[serde(default)]
    pub machines: Vec<MachineConfig>,
    /// Conveyor links between machines (diagram data only).
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl LineConfig {
    /// Machine names in configuration order.
    pub fn machine_names(&self) -> impl Iterator<Item = &str> {
        self.machines.iter().map(|machine| machine.name.as_str())
    }
}

/// A machine placed on a line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineConfig {
    /// Editor-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Name the machine reports as CFX `Source`.
    pub name: String,
    /// Equipment model.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Diagram x position.
    #[serde(default)]
    pub x: f64,
    /// Diagram y position.
    #[serde(default)]
    pub y: f64,
    /// Optional picture shown in the diagram.
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Broker endpoint the machine publishes on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfx: Option<CfxEndpoint>,
    /// Free-form machine parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl MachineConfig {
    /// Minimal machine entry carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            kind: String::new(),
            x: 0.0,
            y: 0.0,
            image_url: None,
            cfx: None,
            params: BTreeMap::new(),
        }
    }
}

/// MQTT endpoint advertised for a machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CfxEndpoint {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic the machine publishes on.
    pub topic: String,
}

/// Directed link between two machines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    /// Upstream machine id.
    #[serde(rename = "fromId")]
    pub from_id: String,
    /// Downstream machine id.
    #[serde(rename = "toId")]
    pub to_id: String,
}

/// A machine name claimed by more than one line. Routing keeps the later line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameCollision {
    /// Machine name shared by several lines.
    pub machine: String,
    /// Line that owned the name before being overridden.
    pub previous_line: String,
    /// Line that owns the name after the override.
    pub winning_line: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_editor_document() {
        let raw = json!({
            "id": "line-a",
            "name": "SMT Line A",
            "machines": [{
                "id": "m1",
                "name": "SPI",
                "type": "CyberOptics",
                "x": 420,
                "y": 160,
                "imageUrl": "",
                "cfx": { "host": "10.0.0.11", "port": 1883, "topic": "cfx/line-a/spi" },
                "params": { "threshold": "0.85" }
            }],
            "connections": [{ "fromId": "m0", "toId": "m1" }]
        });
        let line: LineConfig = serde_json::from_value(raw).expect("valid line");
        assert_eq!(line.machine_names().collect::<Vec<_>>(), vec!["SPI"]);
        assert_eq!(line.machines[0].kind, "CyberOptics");
        assert_eq!(
            line.machines[0].cfx.as_ref().map(|cfx| cfx.port),
            Some(1883)
        );
        assert_eq!(line.connections[0].to_id, "m1");
    }

    #[test]
    fn minimal_machine_only_needs_a_name() {
        let line: LineConfig = serde_json::from_value(json!({
            "id": "line-b",
            "name": "B",
            "machines": [{ "name": "AOI" }]
        }))
        .expect("valid line");
        assert_eq!(line.machines[0], MachineConfig::named("AOI"));
        assert!(line.connections.is_empty());
    }
}
