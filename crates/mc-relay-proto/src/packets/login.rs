//! `login`: Server → Client. Join-game packet carrying the local entity id.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub entity_id: i32,
    pub game_mode: u8,
    pub dimension: i8,
    pub difficulty: u8,
    pub max_players: u8,
    pub level_type: String,
    #[serde(default)]
    pub reduced_debug_info: bool,
}

impl Login {
    /// Placeholder world used to keep a client connected while no server is attached.
    pub fn limbo(entity_id: i32) -> Self {
        Self {
            entity_id,
            game_mode: 3,
            dimension: 1,
            difficulty: 0,
            max_players: 1,
            level_type: "flat".into(),
            reduced_debug_info: false,
        }
    }
}
