//! `entity_destroy`: Server → Client. Batch removal of entities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDestroy {
    pub entity_ids: Vec<i32>,
}
