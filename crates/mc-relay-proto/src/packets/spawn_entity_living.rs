//! `spawn_entity_living`: Server → Client. A mob enters render range.

use serde::{Deserialize, Serialize};

use super::entity_metadata::MetadataEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntityLiving {
    pub entity_id: i32,
    #[serde(rename = "type")]
    pub mob_type: u8,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub yaw: i8,
    pub pitch: i8,
    #[serde(default)]
    pub head_pitch: i8,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}
