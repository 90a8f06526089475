//! `held_item_slot`: Bidirectional. Selected hotbar slot.

use serde::{Deserialize, Serialize};

/// Server → Client form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItemSlotToClient {
    pub slot: i8,
}

/// Client → Server form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldItemSlotToServer {
    pub slot_id: i16,
}
