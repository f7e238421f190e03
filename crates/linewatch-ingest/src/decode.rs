//! CFX payload decoding.

use linewatch_events::CfxMessage;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<CfxMessage>),
    One(Box<CfxMessage>),
}

/// Decode a JSON payload holding one CFX message or an array of them.
///
/// # Errors
///
/// Returns the decode error when the payload is neither shape.
pub fn decode_payload(bytes: &[u8]) -> Result<Vec<CfxMessage>, serde_json::Error> {
    Ok(match serde_json::from_slice::<Payload>(bytes)? {
        Payload::Many(messages) => messages,
        Payload::One(message) => vec![*message],
    })
}
