//! `entity_equipment`: Server → Client.
//!
//! Slot 0 is the held item, 1-4 are boots, leggings, chestplate, helmet.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Number of equipment slots per entity.
pub const EQUIPMENT_SLOTS: usize = 5;
/// Equipment slot of the held item.
pub const HELD_ITEM_SLOT: i16 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEquipment {
    pub entity_id: i32,
    pub slot: i16,
    pub item: Slot,
}
