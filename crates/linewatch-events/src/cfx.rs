//! CFX wire messages and their typed body view.
//!
//! Messages are kept verbatim (the raw `MessageBody` stays a JSON value) so the
//! event history can replay exactly what the equipment emitted. Classification
//! works on the typed [`CfxBody`] view instead of poking at untyped JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `MessageName` of a station state transition.
pub const STATION_STATE_CHANGED: &str = "CFX.ResourcePerformance.StationStateChanged";
/// `MessageName` of an equipment fault.
pub const FAULT_OCCURRED: &str = "CFX.ResourcePerformance.FaultOccurred";

/// A CFX message exactly as it was received from the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CfxMessage {
    /// Fully qualified message type, e.g. `CFX.ResourcePerformance.FaultOccurred`.
    #[serde(rename = "MessageName")]
    pub message_name: String,
    /// CFX protocol version advertised by the sender.
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// ISO-8601 emission timestamp, kept as the sender wrote it.
    #[serde(rename = "TimeStamp")]
    pub time_stamp: String,
    /// Globally unique message identifier; the deduplication key.
    #[serde(rename = "UniqueID")]
    pub unique_id: String,
    /// Name of the emitting machine.
    #[serde(rename = "Source")]
    pub source: String,
    /// Optional addressed recipient.
    #[serde(rename = "Target", default)]
    pub target: Option<String>,
    /// Optional correlation id for request/response pairs.
    #[serde(rename = "RequestID", default)]
    pub request_id: Option<String>,
    /// Kind-specific payload.
    #[serde(rename = "MessageBody", default = "empty_body")]
    pub message_body: Value,
}

fn empty_body() -> Value {
    Value::Object(Map::new())
}

impl CfxMessage {
    /// Decode the typed body for the message kinds the monitor understands.
    ///
    /// A known `MessageName` whose body lacks the fields that kind needs is
    /// reported as [`CfxBody::Unrecognized`] rather than failing.
    #[must_use]
    pub fn body(&self) -> CfxBody {
        match self.message_name.as_str() {
            STATION_STATE_CHANGED => self
                .message_body
                .get("NewState")
                .filter(|value| !value.is_null())
                .map_or(CfxBody::Unrecognized, |value| CfxBody::StationStateChanged {
                    new_state: StateCode(value.clone()),
                }),
            FAULT_OCCURRED => self
                .message_body
                .get("Fault")
                .and_then(|fault| fault.get("FaultCode"))
                .and_then(Value::as_str)
                .map_or(CfxBody::Unrecognized, |code| CfxBody::FaultOccurred {
                    fault_code: code.to_string(),
                }),
            _ => CfxBody::Unrecognized,
        }
    }

    /// Short message kind (last dotted segment), used for logs and filters.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.message_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.message_name)
    }
}

/// Typed view over the message kinds that drive derived state.
#[derive(Debug, Clone, PartialEq)]
pub enum CfxBody {
    /// A station reported a new SEMI E58 equipment state.
    StationStateChanged {
        /// Raw state code from `MessageBody.NewState`.
        new_state: StateCode,
    },
    /// A station reported a fault.
    FaultOccurred {
        /// `MessageBody.Fault.FaultCode`.
        fault_code: String,
    },
    /// Any other message; recorded in history only.
    Unrecognized,
}

/// Equipment state code as carried on the wire (string or number).
#[derive(Debug, Clone, PartialEq)]
pub struct StateCode(pub Value);

impl StateCode {
    /// Parse the wire value as an integer code.
    ///
    /// Strings are trimmed before parsing. Numbers parse when their value is
    /// integral (`1200` and `1200.0` alike); fractions, booleans and
    /// structures do not.
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match &self.0 {
            Value::String(raw) => raw.trim().parse::<i64>().ok(),
            Value::Number(number) => number.as_i64().or_else(|| integral(number.as_f64()?)),
            _ => None,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integral(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64)
        .then_some(value as i64)
}

impl From<&str> for StateCode {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<i64> for StateCode {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}
