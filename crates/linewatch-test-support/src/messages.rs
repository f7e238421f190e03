//! CFX message builders.

use linewatch_events::{CfxMessage, FAULT_OCCURRED, STATION_STATE_CHANGED};
use serde_json::{Value, json};

/// Timestamp stamped on built messages unless overridden.
pub const DEFAULT_TIMESTAMP: &str = "2024-01-15T14:23:15Z";

/// Generic message with an explicit name and body.
#[must_use]
pub fn message(name: &str, unique_id: &str, source: &str, body: Value) -> CfxMessage {
    CfxMessage {
        message_name: name.to_string(),
        version: Some("1.7".to_string()),
        time_stamp: DEFAULT_TIMESTAMP.to_string(),
        unique_id: unique_id.to_string(),
        source: source.to_string(),
        target: None,
        request_id: None,
        message_body: body,
    }
}

/// `StationStateChanged` carrying `NewState` as a string code.
#[must_use]
pub fn state_changed(unique_id: &str, source: &str, new_state: &str) -> CfxMessage {
    message(
        STATION_STATE_CHANGED,
        unique_id,
        source,
        json!({ "NewState": new_state }),
    )
}

/// `FaultOccurred` carrying `Fault.FaultCode`.
#[must_use]
pub fn fault(unique_id: &str, source: &str, fault_code: &str) -> CfxMessage {
    message(
        FAULT_OCCURRED,
        unique_id,
        source,
        json!({ "Fault": { "FaultCode": fault_code } }),
    )
}

/// Same message with a different `TimeStamp`.
#[must_use]
pub fn at(mut message: CfxMessage, time_stamp: &str) -> CfxMessage {
    message.time_stamp = time_stamp.to_string();
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch_events::CfxBody;

    #[test]
    fn builders_produce_typed_bodies() {
        assert!(matches!(
            state_changed("u1", "SPI", "1200").body(),
            CfxBody::StationStateChanged { .. }
        ));
        assert_eq!(
            fault("u2", "Reflow", "E201").body(),
            CfxBody::FaultOccurred {
                fault_code: "E201".to_string()
            }
        );
        assert_eq!(at(fault("u3", "SPI", "E1"), "x").time_stamp, "x");
    }
}
