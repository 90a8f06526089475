//! `named_entity_spawn`: Server → Client. A player entity enters render range.

use serde::{Deserialize, Serialize};

use super::entity_metadata::MetadataEntry;
use crate::types::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntitySpawn {
    pub entity_id: i32,
    #[serde(rename = "playerUUID")]
    pub player_uuid: Uuid,
    /// Fixed-point position.
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: i8,
    pub pitch: i8,
    #[serde(default)]
    pub current_item: i16,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}
