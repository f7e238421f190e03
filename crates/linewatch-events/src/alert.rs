//! Alerts derived from CFX messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cfx::CfxMessage;

/// Severity bucket used by the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Something failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Informational.
    Info,
    /// Something completed.
    Success,
}

/// A single entry in a line's alert feed. Never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    /// `UniqueID` of the originating message.
    pub id: String,
    /// Severity bucket.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Human-readable text.
    pub message: String,
    /// Display time derived from the message timestamp.
    pub time: String,
}

impl Alert {
    /// Build the error alert for a `FaultOccurred` message.
    #[must_use]
    pub fn fault(message: &CfxMessage, fault_code: &str) -> Self {
        Self {
            id: message.unique_id.clone(),
            kind: AlertKind::Error,
            message: format!("Fault on {}: {fault_code}", message.source),
            time: display_time(&message.time_stamp),
        }
    }
}

/// Render an RFC 3339 timestamp as `HH:MM:SS` (UTC); unparseable input is returned as-is.
#[must_use]
pub fn display_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |parsed| parsed.with_timezone(&Utc).format("%H:%M:%S").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fault_alert_uses_source_and_code() {
        let message: CfxMessage = serde_json::from_value(json!({
            "MessageName": "CFX.ResourcePerformance.FaultOccurred",
            "TimeStamp": "2024-01-15T14:24:00Z",
            "UniqueID": "u2",
            "Source": "Reflow",
            "MessageBody": { "Fault": { "FaultCode": "E201" } }
        }))
        .expect("valid message");

        let alert = Alert::fault(&message, "E201");
        assert_eq!(alert.id, "u2");
        assert_eq!(alert.kind, AlertKind::Error);
        assert_eq!(alert.message, "Fault on Reflow: E201");
        assert_eq!(alert.time, "14:24:00");
    }

    #[test]
    fn display_time_normalises_offsets_and_keeps_garbage() {
        assert_eq!(display_time("2024-01-15T16:24:00+02:00"), "14:24:00");
        assert_eq!(display_time("yesterday"), "yesterday");
    }

    #[test]
    fn alert_kind_serialises_lowercase() {
        let alert = Alert {
            id: "a".into(),
            kind: AlertKind::Warning,
            message: "m".into(),
            time: "t".into(),
        };
        let value = serde_json::to_value(&alert).expect("serialise");
        assert_eq!(value["type"], "warning");
    }
}
