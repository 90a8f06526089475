//! `rel_entity_move`: Server → Client. Fixed-point position delta.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelEntityMove {
    #[serde(rename = "entityId")]
    pub entity_id: i32,
    #[serde(rename = "dX")]
    pub dx: i8,
    #[serde(rename = "dY")]
    pub dy: i8,
    #[serde(rename = "dZ")]
    pub dz: i8,
    #[serde(rename = "onGround", default)]
    pub on_ground: Option<bool>,
}
