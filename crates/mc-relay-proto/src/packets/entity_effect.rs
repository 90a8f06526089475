//! `entity_effect` / `remove_entity_effect`: Server → Client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEffect {
    pub entity_id: i32,
    pub effect_id: i8,
    pub amplifier: i8,
    /// Duration in ticks.
    pub duration: i32,
    #[serde(default)]
    pub hide_particles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEntityEffect {
    pub entity_id: i32,
    pub effect_id: i8,
}
