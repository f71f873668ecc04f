use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::vec3::Vec3;

/// Opaque player identifier assigned by the relay at connect time.
pub type PlayerId = String;

// === Server -> Client ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "init")]
    Init(InitMsg),
    #[serde(rename = "spawn")]
    Spawn(SpawnMsg),
    #[serde(rename = "update")]
    Update(UpdateMsg),
    #[serde(rename = "despawn")]
    Despawn(DespawnMsg),
    #[serde(rename = "playerFired")]
    PlayerFired(PlayerFiredMsg),
}

/// Sent once, to the new connection only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InitMsg {
    pub players: Vec<PlayerWire>,
    pub your_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpawnMsg {
    pub player: PlayerWire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateMsg {
    pub player: PlayerWire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DespawnMsg {
    pub id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerFiredMsg {
    pub id: PlayerId,
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: PlayerId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rot_y: f64,
    pub rot_x: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

// === Client -> Server ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "input")]
    Input {
        x: f64,
        y: f64,
        z: f64,
        #[serde(rename = "rotY")]
        rot_y: f64,
        #[serde(rename = "rotX")]
        rot_x: f64,
    },
    #[serde(rename = "shoot")]
    Shoot {
        origin: Vec3,
        direction: Vec3,
        #[serde(rename = "hitId", default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        hit_id: Option<String>,
    },
}

// === Decoding ===

/// Why an inbound payload could not be turned into a message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message has no string `type` field")]
    MissingType,
    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

impl DecodeError {
    /// Unknown types are expected from newer peers and are not worth a warning.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, DecodeError::UnknownType(_))
    }
}

const CLIENT_TYPES: &[&str] = &["input", "shoot"];
const SERVER_TYPES: &[&str] = &["init", "spawn", "update", "despawn", "playerFired"];

/// Parse a `type`-tagged JSON object, separating "not a message" from
/// "a message we don't know" so callers can treat them differently.
fn decode_tagged<T: DeserializeOwned>(text: &str, known: &[&str]) -> Result<T, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(DecodeError::MissingType)?;
    if !known.contains(&kind) {
        return Err(DecodeError::UnknownType(kind.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

impl ClientMsg {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        decode_tagged(text, CLIENT_TYPES)
    }
}

impl ServerMsg {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        decode_tagged(text, SERVER_TYPES)
    }
}
