//! `set_slot`: Server → Client. One slot of a window, or the cursor.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// `windowId` and `slot` of a cursor update.
pub const CURSOR_WINDOW: i8 = -1;
pub const CURSOR_SLOT: i16 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSlot {
    pub window_id: i8,
    pub slot: i16,
    pub item: Slot,
}

impl SetSlot {
    pub fn is_cursor(&self) -> bool {
        self.window_id == CURSOR_WINDOW && self.slot == CURSOR_SLOT
    }
}
