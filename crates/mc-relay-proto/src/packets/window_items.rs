//! `window_items`: Server → Client. Full contents of a window.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowItems {
    pub window_id: u8,
    pub items: Vec<Slot>,
}
