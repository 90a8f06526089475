//! Inventory slot contents as carried in decoded window packets.
//!
//! On the wire an empty slot is `{"blockId": -1}`; anything else is an item
//! stack with a positive count. A stack whose count reaches zero reverts to
//! [`Slot::Empty`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default maximum stack size.
pub const DEFAULT_MAX_STACK: u8 = 64;

/// Item ids that stack to 16.
const STACK_16: &[i16] = &[323, 325, 332, 344, 368, 425];

/// Item ids (or inclusive id ranges) that do not stack.
const UNSTACKABLE: &[(i16, i16)] = &[
    (256, 261), // iron tools, flint and steel, bow
    (267, 279), // swords, tools
    (282, 286), // stew, gold tools
    (290, 294), // hoes
    (298, 317), // armor
    (326, 330), // buckets, minecart, saddle, iron door
    (333, 333), // boat
    (335, 335), // milk bucket
    (342, 343), // chest/furnace minecart
    (346, 346), // fishing rod
    (354, 355), // cake, bed
    (358, 359), // map, shears
    (373, 373), // potion
    (386, 387), // book and quill, written book
    (398, 398), // carrot on a stick
    (403, 403), // enchanted book
    (407, 408), // TNT/hopper minecart
    (417, 419), // horse armor
    (422, 422), // command block minecart
    (2256, 2267), // records
];

/// Maximum stack size for an item id.
pub fn max_stack_size(item_id: i16) -> u8 {
    if STACK_16.contains(&item_id) {
        16
    } else if UNSTACKABLE
        .iter()
        .any(|(lo, hi)| (*lo..=*hi).contains(&item_id))
    {
        1
    } else {
        DEFAULT_MAX_STACK
    }
}

/// A non-empty item stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    /// Item (or block) id.
    pub id: i16,
    /// Stack size, always > 0.
    pub count: u8,
    /// Damage / variant value.
    pub damage: i16,
    /// Opaque NBT payload as decoded by the codec.
    pub nbt: Option<serde_json::Value>,
}

impl ItemStack {
    pub fn new(id: i16, count: u8) -> Self {
        Self {
            id,
            count,
            damage: 0,
            nbt: None,
        }
    }

    pub fn with_damage(mut self, damage: i16) -> Self {
        self.damage = damage;
        self
    }

    pub fn max_stack(&self) -> u8 {
        max_stack_size(self.id)
    }

    /// Whether two stacks can merge: same id, damage and NBT.
    pub fn same_kind(&self, other: &ItemStack) -> bool {
        self.id == other.id && self.damage == other.damage && self.nbt == other.nbt
    }
}

/// Contents of one inventory slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Empty,
    Item(ItemStack),
}

impl Slot {
    /// Build a slot, collapsing a zero count to [`Slot::Empty`].
    pub fn of(id: i16, count: u8) -> Self {
        Self::from_stack(ItemStack::new(id, count))
    }

    pub fn from_stack(stack: ItemStack) -> Self {
        if stack.count == 0 || stack.id < 0 {
            Slot::Empty
        } else {
            Slot::Item(stack)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn stack(&self) -> Option<&ItemStack> {
        match self {
            Slot::Empty => None,
            Slot::Item(stack) => Some(stack),
        }
    }

    pub fn count(&self) -> u8 {
        self.stack().map_or(0, |s| s.count)
    }

    pub fn item_id(&self) -> Option<i16> {
        self.stack().map(|s| s.id)
    }

    /// Maximum stack size of the held item; 0 for an empty slot.
    pub fn max_stack(&self) -> u8 {
        self.stack().map_or(0, ItemStack::max_stack)
    }

    /// Room left before the stack is full; 0 for an empty slot.
    pub fn room(&self) -> u8 {
        self.max_stack().saturating_sub(self.count())
    }

    pub fn is_full(&self) -> bool {
        !self.is_empty() && self.room() == 0
    }

    /// Whether both slots hold stacks that can merge.
    pub fn same_kind(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Item(a), Slot::Item(b)) => a.same_kind(b),
            _ => false,
        }
    }

    /// Whether at least one item of `other` fits here: the slot is empty,
    /// or holds the same kind with room left.
    pub fn accepts(&self, other: &Slot) -> bool {
        self.is_empty() || (self.same_kind(other) && self.room() > 0)
    }

    /// Remove up to `n` items, reverting to empty at zero. Returns how many were removed.
    pub fn shrink(&mut self, n: u8) -> u8 {
        let removed = match self {
            Slot::Empty => return 0,
            Slot::Item(stack) => {
                let removed = n.min(stack.count);
                stack.count -= removed;
                removed
            }
        };
        if self.count() == 0 {
            *self = Slot::Empty;
        }
        removed
    }

    /// Add `n` items to a non-empty stack without checking the cap.
    pub fn grow(&mut self, n: u8) {
        if let Slot::Item(stack) = self {
            stack.count = stack.count.saturating_add(n);
        }
    }

    /// Split off up to `n` items into a new slot of the same kind.
    pub fn split(&mut self, n: u8) -> Slot {
        let template = match self {
            Slot::Empty => return Slot::Empty,
            Slot::Item(stack) => stack.clone(),
        };
        let taken = self.shrink(n);
        Slot::from_stack(ItemStack {
            count: taken,
            ..template
        })
    }

    pub fn take(&mut self) -> Slot {
        std::mem::take(self)
    }
}

/// Wire shape of a slot.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSlot {
    block_id: i16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_damage: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbt_data: Option<serde_json::Value>,
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            Slot::Empty => RawSlot {
                block_id: -1,
                item_count: None,
                item_damage: None,
                nbt_data: None,
            },
            Slot::Item(stack) => RawSlot {
                block_id: stack.id,
                item_count: Some(stack.count),
                item_damage: Some(stack.damage),
                nbt_data: stack.nbt.clone(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<RawSlot> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => Slot::Empty,
            Some(raw) => Slot::from_stack(ItemStack {
                id: raw.block_id,
                count: raw.item_count.unwrap_or(0),
                damage: raw.item_damage.unwrap_or(0),
                nbt: raw.nbt_data.filter(|v| !v.is_null()),
            }),
        })
    }
}
