use serde_json::Value;

use super::messages::{ClientMessage, Envelope, ServerMessage};

/// Maximum accepted frame size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    /// Not JSON, or the envelope is missing its `type` discriminator.
    Malformed(String),
    /// Well-formed envelope carrying a type this server does not know.
    UnknownType(String),
    SerializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed message: {e}"),
            Self::UnknownType(t) => write!(f, "unknown message type: {t}"),
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Decode an inbound text frame. The `type` discriminator is matched
/// case-insensitively; payload fields the variant does not use are kept
/// inside the opaque value.
pub fn decode_client_message(raw: &str) -> Result<ClientMessage, ProtocolError> {
    let env: Envelope =
        serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let msg = match env.kind.to_lowercase().as_str() {
        "name" => ClientMessage::Name {
            name: env
                .data
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "in" => ClientMessage::Input(env.data),
        "start" => ClientMessage::Start,
        "stateres" => ClientMessage::StateResponse(env.data),
        "join" => ClientMessage::Join(env.data),
        other => return Err(ProtocolError::UnknownType(other.to_string())),
    };
    Ok(msg)
}

/// Encode an outbound message to its JSON text frame.
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::SerializeError(e.to_string()))
}
