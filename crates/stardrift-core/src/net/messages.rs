use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::player::PlayerId;

/// Wire envelope: every frame is a JSON text object
/// `{"type": string, "data": any}`. `data` is optional.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Messages a client may send.
///
/// Game payloads (input snapshots, ship state, full match state) are
/// opaque to the relay and carried as raw JSON values.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Set the sender's display name.
    Name { name: String },
    /// Per-frame input snapshot, relayed to universe peers.
    Input(Value),
    /// The sender wants to start (or join) the match.
    Start,
    /// Full state snapshot answering a `statereq`; `data.id` names the
    /// player the snapshot is for.
    StateResponse(Value),
    /// The sender's ship spawned; announce it to peers.
    Join(Value),
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// The slot id assigned at connect, as a string.
    #[serde(rename = "reg")]
    Reg(String),
    /// Ask the authority for a snapshot on behalf of the named player.
    #[serde(rename = "statereq")]
    StateRequest(PlayerId),
    /// Deliver a full state snapshot to a late joiner.
    #[serde(rename = "stateset")]
    StateSet(Value),
    /// A peer's ship entered the match.
    #[serde(rename = "joined")]
    Joined(JoinedPayload),
    /// A peer's input for this frame.
    #[serde(rename = "in")]
    Input(InputPayload),
}

/// Payload of a `joined` relay: the ship state as the peer sent it,
/// tagged with its slot id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedPayload {
    pub id: PlayerId,
    pub ship: Value,
}

/// Payload of an `in` relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPayload {
    pub id: PlayerId,
    #[serde(rename = "in")]
    pub input: Value,
}
