//! `open_window`: Server → Client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWindow {
    pub window_id: u8,
    pub inventory_type: String,
    /// JSON chat component.
    pub window_title: String,
    /// Number of container slots, not counting the player inventory.
    pub slot_count: u8,
    #[serde(default)]
    pub entity_id: Option<i32>,
}
