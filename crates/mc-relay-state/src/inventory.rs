//! Inventory shadow and client-side click resolution.
//!
//! Click packets only carry intent (mode, button, slot). The resulting slot
//! contents are computed here from the current shadow the same way a client
//! computes them, so the shadow stays in step with the server until the next
//! `window_items` / `set_slot` refresh overwrites it.
//!
//! Main array layout (player window 0):
//!
//! | index  | contents        |
//! |--------|-----------------|
//! | 0      | crafting output |
//! | 1..5   | crafting grid   |
//! | 5..9   | armor           |
//! | 9..36  | inventory       |
//! | 36..45 | hotbar          |
//!
//! While a container window is open, wire indices below the container size
//! address the container; higher indices address the main array at
//! `index - container_size + HOTBAR_OFFSET`.

use std::ops::Range;

use mc_relay_proto::packets::window_click::mode;
use mc_relay_proto::packets::{
    name, CloseWindow, OpenWindow, SetSlot, Transaction, WindowClick, WindowItems,
};
use mc_relay_proto::{Direction, ItemStack, Packet, ProtoError, Slot};
use tracing::{debug, trace};

use crate::store::ShadowState;

pub const MAIN_SIZE: usize = 45;
/// Offset applied when translating container-window indices into the main array.
pub const HOTBAR_OFFSET: usize = 9;
pub const CRAFTING: Range<usize> = 0..5;
pub const ARMOR: Range<usize> = 5..9;
pub const STORAGE: Range<usize> = 9..36;
pub const HOTBAR: Range<usize> = 36..45;
/// Window id of the player's own inventory.
pub const PLAYER_WINDOW: u8 = 0;

static EMPTY: Slot = Slot::Empty;

/// A resolved slot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Container(usize),
    Main(usize),
}

impl SlotRef {
    pub fn hotbar(n: usize) -> Self {
        SlotRef::Main(HOTBAR.start + n)
    }
}

/// An open container window.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub window_id: u8,
    pub inventory_type: String,
    pub title: String,
    pub slots: Vec<Slot>,
}

impl Container {
    pub fn new(window_id: u8, inventory_type: impl Into<String>, title: impl Into<String>, size: usize) -> Self {
        Self {
            window_id,
            inventory_type: inventory_type.into(),
            title: title.into(),
            slots: vec![Slot::Empty; size],
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragKind {
    Left,
    Right,
    Middle,
}

impl DragKind {
    fn from_index(index: i8) -> Option<Self> {
        match index {
            0 => Some(DragKind::Left),
            1 => Some(DragKind::Right),
            2 => Some(DragKind::Middle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Drag {
    kind: DragKind,
    candidates: Vec<SlotRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    main: Vec<Slot>,
    container: Option<Container>,
    cursor: Slot,
    drag: Option<Drag>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            main: vec![Slot::Empty; MAIN_SIZE],
            container: None,
            cursor: Slot::Empty,
            drag: None,
        }
    }
}

impl Inventory {
    // --- Read access ---

    pub fn main(&self) -> &[Slot] {
        &self.main
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn cursor(&self) -> &Slot {
        &self.cursor
    }

    pub fn hotbar(&self) -> &[Slot] {
        &self.main[HOTBAR]
    }

    /// Item in hotbar slot `held` (0..9).
    pub fn held_item(&self, held: u8) -> &Slot {
        self.main.get(HOTBAR.start + held as usize).unwrap_or(&EMPTY)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&Slot> {
        match slot {
            SlotRef::Main(i) => self.main.get(i),
            SlotRef::Container(i) => self.container.as_ref()?.slots.get(i),
        }
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Option<&mut Slot> {
        match slot {
            SlotRef::Main(i) => self.main.get_mut(i),
            SlotRef::Container(i) => self.container.as_mut()?.slots.get_mut(i),
        }
    }

    /// Borrow a slot together with the cursor.
    fn with_cursor(&mut self, slot: SlotRef) -> Option<(&mut Slot, &mut Slot)> {
        let Inventory {
            main,
            container,
            cursor,
            ..
        } = self;
        let slot = match slot {
            SlotRef::Main(i) => main.get_mut(i)?,
            SlotRef::Container(i) => container.as_mut()?.slots.get_mut(i)?,
        };
        Some((slot, cursor))
    }

    /// Translate a wire slot index for `window_id`.
    pub fn resolve(&self, window_id: u8, index: i16) -> Option<SlotRef> {
        let index = usize::try_from(index).ok()?;
        let container_size = match &self.container {
            Some(c) if window_id != PLAYER_WINDOW => c.size(),
            _ => 0,
        };
        if index < container_size {
            return Some(SlotRef::Container(index));
        }
        let main = if container_size == 0 {
            index
        } else {
            index - container_size + HOTBAR_OFFSET
        };
        (main < MAIN_SIZE).then_some(SlotRef::Main(main))
    }

    // --- Refresh and window lifecycle ---

    pub(crate) fn open_window(&mut self, open: &OpenWindow) {
        self.container = Some(Container::new(
            open.window_id,
            open.inventory_type.clone(),
            open.window_title.clone(),
            open.slot_count as usize,
        ));
        self.drag = None;
    }

    pub(crate) fn close_window(&mut self) {
        self.container = None;
        self.cursor = Slot::Empty;
        self.drag = None;
    }

    pub(crate) fn set_slot(&mut self, update: SetSlot) {
        if update.is_cursor() {
            self.cursor = update.item;
            return;
        }
        let Ok(window_id) = u8::try_from(update.window_id) else {
            debug!(window = update.window_id, slot = update.slot, "set_slot for unknown window");
            return;
        };
        if window_id != PLAYER_WINDOW
            && self.container.as_ref().map(|c| c.window_id) != Some(window_id)
        {
            trace!(window = window_id, "set_slot for a window that is not open");
            return;
        }
        match self.resolve(window_id, update.slot).and_then(|r| self.slot_mut(r)) {
            Some(slot) => *slot = update.item,
            None => debug!(window = window_id, slot = update.slot, "set_slot index out of range"),
        }
    }

    pub(crate) fn set_window_items(&mut self, update: WindowItems) {
        let mut items = update.items.into_iter();
        if update.window_id == PLAYER_WINDOW {
            for (slot, item) in self.main.iter_mut().zip(items) {
                *slot = item;
            }
            return;
        }
        let size = update_container_size(&self.container, update.window_id, items.len());
        let container = self
            .container
            .get_or_insert_with(|| Container::new(update.window_id, "", "", size));
        container.window_id = update.window_id;
        container.slots = items.by_ref().take(size).collect();
        container.slots.resize(size, Slot::Empty);
        for (slot, item) in self.main[HOTBAR_OFFSET..].iter_mut().zip(items) {
            *slot = item;
        }
    }

    // --- Click resolution ---

    /// Apply a client click to the shadow.
    pub fn click(&mut self, click: &WindowClick, creative: bool) {
        if click.mode != mode::DRAG {
            self.drag = None;
        }
        let target = if click.is_outside() {
            None
        } else {
            match self.resolve(click.window_id, click.slot) {
                Some(r) => Some(r),
                None => {
                    trace!(slot = click.slot, "click on unaddressable slot");
                    if click.mode != mode::DRAG {
                        return;
                    }
                    None
                }
            }
        };

        match click.mode {
            mode::CLICK => match (click.mouse_button, target) {
                (0, None) => self.cursor = Slot::Empty,
                (0, Some(r)) => self.left_click(r),
                (1, None) => {
                    self.cursor.shrink(1);
                }
                (1, Some(r)) => self.right_click(r),
                (button, _) => debug!(button, "unknown click button"),
            },
            mode::SHIFT_CLICK => {
                if let Some(r) = target {
                    self.shift_click(r);
                }
            }
            mode::NUMBER_KEY => {
                if let (Some(r), Ok(n)) = (target, usize::try_from(click.mouse_button)) {
                    if n < HOTBAR.len() {
                        self.number_key(r, n);
                    }
                }
            }
            mode::MIDDLE_CLICK => {
                if !creative || !self.cursor.is_empty() {
                    return;
                }
                let clone = target.and_then(|r| self.slot(r)).and_then(Slot::stack).map(|stack| {
                    ItemStack {
                        count: stack.max_stack(),
                        ..stack.clone()
                    }
                });
                if let Some(stack) = clone {
                    self.cursor = Slot::Item(stack);
                }
            }
            mode::DROP => {
                if let Some(slot) = target.and_then(|r| self.slot_mut(r)) {
                    match click.mouse_button {
                        0 => {
                            slot.shrink(1);
                        }
                        1 => *slot = Slot::Empty,
                        _ => {}
                    }
                }
            }
            mode::DRAG => self.drag(click.mouse_button, target, creative),
            mode::DOUBLE_CLICK => self.gather(),
            other => debug!(mode = other, "unknown click mode"),
        }
    }

    fn left_click(&mut self, r: SlotRef) {
        let Some((slot, cursor)) = self.with_cursor(r) else {
            return;
        };
        if slot.same_kind(cursor) {
            let moved = cursor.count().min(slot.room());
            slot.grow(moved);
            cursor.shrink(moved);
        } else {
            std::mem::swap(slot, cursor);
        }
    }

    fn right_click(&mut self, r: SlotRef) {
        let Some((slot, cursor)) = self.with_cursor(r) else {
            return;
        };
        if cursor.is_empty() {
            let half = slot.count().div_ceil(2);
            *cursor = slot.split(half);
        } else if slot.is_empty() {
            *slot = cursor.split(1);
        } else if slot.same_kind(cursor) {
            if slot.room() > 0 {
                cursor.shrink(1);
                slot.grow(1);
            }
        } else {
            std::mem::swap(slot, cursor);
        }
    }

    /// Shift-click destinations for a source slot, in priority order.
    fn shift_targets(&self, source: SlotRef) -> Vec<SlotRef> {
        let main = |range: Range<usize>| range.map(SlotRef::Main);
        match (&self.container, source) {
            (Some(_), SlotRef::Container(_)) => main(HOTBAR).chain(main(STORAGE)).collect(),
            (Some(c), SlotRef::Main(_)) => (0..c.size()).map(SlotRef::Container).collect(),
            (None, SlotRef::Main(i)) if HOTBAR.contains(&i) => main(STORAGE).collect(),
            (None, SlotRef::Main(i)) if STORAGE.contains(&i) => main(HOTBAR).collect(),
            (None, SlotRef::Main(_)) => main(STORAGE).chain(main(HOTBAR)).collect(),
            (None, SlotRef::Container(_)) => Vec::new(),
        }
    }

    /// Merge `item` into same-kind slots with room, then the first empty
    /// slot, in `targets` order. Returns what did not fit.
    fn insert(&mut self, mut item: Slot, targets: &[SlotRef]) -> Slot {
        for &t in targets {
            if item.is_empty() {
                return item;
            }
            if let Some(slot) = self.slot_mut(t) {
                if slot.same_kind(&item) {
                    let moved = item.count().min(slot.room());
                    slot.grow(moved);
                    item.shrink(moved);
                }
            }
        }
        if item.is_empty() {
            return item;
        }
        for &t in targets {
            if let Some(slot) = self.slot_mut(t) {
                if slot.is_empty() {
                    *slot = item;
                    return Slot::Empty;
                }
            }
        }
        item
    }

    fn shift_click(&mut self, source: SlotRef) {
        let targets = self.shift_targets(source);
        let Some(moving) = self.slot_mut(source).map(Slot::take) else {
            return;
        };
        if moving.is_empty() {
            return;
        }
        let rest = self.insert(moving, &targets);
        if let Some(slot) = self.slot_mut(source) {
            *slot = rest;
        }
    }

    fn number_key(&mut self, hovered: SlotRef, n: usize) {
        let hotbar = SlotRef::hotbar(n);
        if hovered == hotbar {
            return;
        }
        match hovered {
            SlotRef::Main(i) => self.main.swap(i, HOTBAR.start + n),
            SlotRef::Container(i) => {
                let held = self.main[HOTBAR.start + n].take();
                let Some(slot) = self.container.as_mut().and_then(|c| c.slots.get_mut(i)) else {
                    self.main[HOTBAR.start + n] = held;
                    return;
                };
                if slot.is_empty() || held.is_empty() {
                    self.main[HOTBAR.start + n] = std::mem::replace(slot, held);
                } else if slot.same_kind(&held) {
                    let mut held = held;
                    let moved = held.count().min(slot.room());
                    slot.grow(moved);
                    held.shrink(moved);
                    self.main[HOTBAR.start + n] = held;
                } else {
                    let displaced = std::mem::replace(slot, held);
                    let targets: Vec<SlotRef> =
                        HOTBAR.chain(STORAGE).map(SlotRef::Main).collect();
                    let rest = self.insert(displaced, &targets);
                    if !rest.is_empty() {
                        debug!(count = rest.count(), "number-key swap left items unplaced");
                    }
                }
            }
        }
    }

    fn drag(&mut self, button: i8, target: Option<SlotRef>, creative: bool) {
        let Some(kind) = DragKind::from_index(button / 4) else {
            self.drag = None;
            return;
        };
        match button % 4 {
            0 => {
                self.drag = target.is_none().then_some(Drag {
                    kind,
                    candidates: Vec::new(),
                });
            }
            1 => {
                let added = match (self.drag.as_mut(), target) {
                    (Some(drag), Some(r)) if drag.kind == kind => {
                        if !drag.candidates.contains(&r) {
                            drag.candidates.push(r);
                        }
                        true
                    }
                    _ => false,
                };
                if !added {
                    self.drag = None;
                }
            }
            2 => {
                let Some(drag) = self.drag.take() else {
                    return;
                };
                if drag.kind != kind || target.is_some() {
                    return;
                }
                match kind {
                    DragKind::Left => self.spread_even(&drag.candidates),
                    DragKind::Right => self.spread_one(&drag.candidates),
                    DragKind::Middle if creative => self.spread_clone(&drag.candidates),
                    DragKind::Middle => {}
                }
            }
            _ => self.drag = None,
        }
    }

    fn accepting(&self, candidates: &[SlotRef]) -> Vec<SlotRef> {
        candidates
            .iter()
            .copied()
            .filter(|&r| self.slot(r).is_some_and(|s| s.accepts(&self.cursor)))
            .collect()
    }

    fn spread_even(&mut self, candidates: &[SlotRef]) {
        let accepting = self.accepting(candidates);
        if accepting.is_empty() || self.cursor.is_empty() {
            return;
        }
        let per_slot = usize::from(self.cursor.count()) / accepting.len();
        let Ok(per_slot) = u8::try_from(per_slot) else {
            return;
        };
        if per_slot == 0 {
            return;
        }
        let cap = self.cursor.max_stack();
        for r in accepting {
            let Some((slot, cursor)) = self.with_cursor(r) else {
                continue;
            };
            if slot.is_empty() {
                *slot = cursor.split(per_slot.min(cap));
            } else {
                let moved = per_slot.min(slot.room()).min(cursor.count());
                slot.grow(moved);
                cursor.shrink(moved);
            }
        }
    }

    fn spread_one(&mut self, candidates: &[SlotRef]) {
        for r in self.accepting(candidates) {
            let Some((slot, cursor)) = self.with_cursor(r) else {
                continue;
            };
            if cursor.is_empty() {
                return;
            }
            if slot.is_empty() {
                *slot = cursor.split(1);
            } else {
                cursor.shrink(1);
                slot.grow(1);
            }
        }
    }

    fn spread_clone(&mut self, candidates: &[SlotRef]) {
        let Slot::Item(stack) = self.cursor.clone() else {
            return;
        };
        let full = Slot::Item(ItemStack {
            count: stack.max_stack(),
            ..stack
        });
        for &r in candidates {
            if let Some(slot) = self.slot_mut(r) {
                if slot.is_empty() {
                    *slot = full.clone();
                }
            }
        }
    }

    /// Double-click gather into the cursor.
    fn gather(&mut self) {
        if self.cursor.is_empty() {
            return;
        }
        let cap = self.cursor.max_stack();
        let container_size = self.container.as_ref().map_or(0, Container::size);
        let order: Vec<SlotRef> = (0..container_size)
            .map(SlotRef::Container)
            .chain((HOTBAR_OFFSET..MAIN_SIZE).map(SlotRef::Main))
            .collect();
        for take_full in [false, true] {
            for &r in &order {
                let Some((slot, cursor)) = self.with_cursor(r) else {
                    continue;
                };
                if cursor.count() >= cap {
                    return;
                }
                if !slot.same_kind(cursor) || slot.is_full() != take_full {
                    continue;
                }
                let moved = slot.count().min(cap - cursor.count());
                slot.shrink(moved);
                cursor.grow(moved);
            }
        }
    }
}

fn update_container_size(container: &Option<Container>, window_id: u8, items: usize) -> usize {
    match container {
        Some(c) if c.window_id == window_id => c.size(),
        _ => items.saturating_sub(MAIN_SIZE - HOTBAR_OFFSET),
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub(crate) fn apply(state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
    match (packet.direction, packet.name.as_str()) {
        (Direction::ToServer, name::WINDOW_CLICK) => {
            let click: WindowClick = packet.parse()?;
            let creative = state.local.is_creative();
            state.inventory.click(&click, creative);
        }
        (_, name::CLOSE_WINDOW) => {
            let close: CloseWindow = packet.parse()?;
            trace!(window = close.window_id, direction = %packet.direction, "window closed");
            state.inventory.close_window();
        }
        (Direction::ToClient, name::OPEN_WINDOW) => {
            let open: OpenWindow = packet.parse()?;
            state.inventory.open_window(&open);
        }
        (Direction::ToClient, name::WINDOW_ITEMS) => {
            state.inventory.set_window_items(packet.parse()?);
        }
        (Direction::ToClient, name::SET_SLOT) => {
            state.inventory.set_slot(packet.parse()?);
        }
        (_, name::TRANSACTION) => {
            let tx: Transaction = packet.parse()?;
            if !tx.accepted {
                debug!(window = tx.window_id, action = tx.action, "click rejected by server");
            }
        }
        (_, other) => trace!(packet = other, "not an inventory packet"),
    }
    Ok(())
}
