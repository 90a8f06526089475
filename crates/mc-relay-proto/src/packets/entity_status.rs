//! `entity_status`: Server → Client. One-shot entity status codes.

use serde::{Deserialize, Serialize};

/// Status codes the relay reacts to.
pub mod status {
    /// Entity was hurt.
    pub const HURT: i8 = 2;
    /// Entity died.
    pub const DEAD: i8 = 3;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatus {
    pub entity_id: i32,
    pub entity_status: i8,
}
