//! `entity_look`, `entity_move_look`, `entity_head_rotation`: Server → Client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLook {
    pub entity_id: i32,
    pub yaw: i8,
    pub pitch: i8,
    #[serde(default)]
    pub on_ground: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMoveLook {
    #[serde(rename = "entityId")]
    pub entity_id: i32,
    #[serde(rename = "dX")]
    pub dx: i8,
    #[serde(rename = "dY")]
    pub dy: i8,
    #[serde(rename = "dZ")]
    pub dz: i8,
    pub yaw: i8,
    pub pitch: i8,
    #[serde(rename = "onGround", default)]
    pub on_ground: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeadRotation {
    pub entity_id: i32,
    pub head_yaw: i8,
}
