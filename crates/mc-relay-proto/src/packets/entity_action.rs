//! `entity_action`: Client → Server. Crouch/sprint toggles.

use serde::{Deserialize, Serialize};

/// Values of [`EntityAction::action_id`].
pub mod action {
    pub const START_SNEAKING: i32 = 0;
    pub const STOP_SNEAKING: i32 = 1;
    pub const LEAVE_BED: i32 = 2;
    pub const START_SPRINTING: i32 = 3;
    pub const STOP_SPRINTING: i32 = 4;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAction {
    pub entity_id: i32,
    pub action_id: i32,
    #[serde(default)]
    pub jump_boost: i32,
}
