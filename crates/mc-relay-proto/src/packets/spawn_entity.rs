//! `spawn_entity`: Server → Client. A non-living object (arrow, item, minecart).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntity {
    pub entity_id: i32,
    #[serde(rename = "type")]
    pub object_type: i8,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub pitch: i8,
    pub yaw: i8,
}
