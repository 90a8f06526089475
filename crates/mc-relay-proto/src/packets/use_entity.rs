//! `use_entity`: Client → Server. Interact with or attack an entity.

use serde::{Deserialize, Serialize};

/// Values of [`UseEntity::mouse`].
pub mod mouse {
    pub const INTERACT: i32 = 0;
    pub const ATTACK: i32 = 1;
    pub const INTERACT_AT: i32 = 2;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseEntity {
    pub target: i32,
    pub mouse: i32,
}
