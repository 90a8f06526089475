//! Named packets as produced by the codec.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Which peer a packet is travelling towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Client → relay → server.
    ToServer,
    /// Server → relay → client.
    ToClient,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::ToServer => Direction::ToClient,
            Direction::ToClient => Direction::ToServer,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToServer => f.write_str("toServer"),
            Direction::ToClient => f.write_str("toClient"),
        }
    }
}

/// Connection protocol state. Selects which packet table the codec uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    Handshaking,
    Status,
    Login,
    Play,
}

/// A decoded packet: its protocol name, travel direction, and decoded fields.
///
/// Fields are kept as JSON so an unknown or partially understood packet can
/// be re-encoded exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub name: String,
    pub direction: Direction,
    #[serde(default)]
    pub fields: serde_json::Value,
}

impl Packet {
    pub fn new(name: impl Into<String>, direction: Direction, fields: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            direction,
            fields,
        }
    }

    /// Build a packet from a typed field struct.
    pub fn from_fields<T: Serialize>(
        name: impl Into<String>,
        direction: Direction,
        fields: &T,
    ) -> Result<Self, ProtoError> {
        Ok(Self::new(name, direction, serde_json::to_value(fields)?))
    }

    /// Parse the fields into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ProtoError> {
        T::deserialize(&self.fields).map_err(|e| ProtoError::MalformedFields {
            packet: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Read a single integer field, if present.
    pub fn field_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(|v| v.as_i64())
    }

    /// Read a single string field, if present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct KeepAlive {
        keep_alive_id: i32,
    }

    #[test]
    fn opposite_direction() {
        assert_eq!(Direction::ToServer.opposite(), Direction::ToClient);
        assert_eq!(Direction::ToClient.opposite(), Direction::ToServer);
    }

    #[test]
    fn parse_typed_fields() {
        let pkt = Packet::new("keep_alive", Direction::ToClient, json!({"keepAliveId": 7}));
        let ka: KeepAlive = pkt.parse().unwrap();
        assert_eq!(ka.keep_alive_id, 7);
        assert_eq!(pkt.field_i64("keepAliveId"), Some(7));
    }

    #[test]
    fn malformed_fields_error_names_packet() {
        let pkt = Packet::new("keep_alive", Direction::ToClient, json!({"wrong": true}));
        let err = pkt.parse::<KeepAlive>().unwrap_err();
        match err {
            ProtoError::MalformedFields { packet, .. } => assert_eq!(packet, "keep_alive"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_fields_uses_camel_case() {
        let pkt = Packet::from_fields(
            "keep_alive",
            Direction::ToServer,
            &KeepAlive { keep_alive_id: 3 },
        )
        .unwrap();
        assert_eq!(pkt.fields, json!({"keepAliveId": 3}));
    }
}
