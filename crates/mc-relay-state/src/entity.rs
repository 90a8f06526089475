//! Entity records and the entity lifecycle handler.
//!
//! Spawn, destroy, metadata, equipment, effect and status packets land here.
//! Movement packets live in [`crate::movement`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mc_relay_proto::packets::entity_equipment::{EQUIPMENT_SLOTS, HELD_ITEM_SLOT};
use mc_relay_proto::packets::entity_metadata::{self, flag, key, MetadataEntry};
use mc_relay_proto::packets::entity_status::status;
use mc_relay_proto::packets::{
    name, EntityDestroy, EntityEffect, EntityEquipment, EntityMetadata, EntityStatus,
    NamedEntitySpawn, RemoveEntityEffect, SpawnEntity, SpawnEntityLiving,
};
use mc_relay_proto::types::{angle_to_degrees, Uuid, Vec3};
use mc_relay_proto::{Packet, ProtoError, Slot};
use tracing::{debug, trace};

use crate::store::ShadowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    /// Living mob with its network type id.
    Mob(u8),
    /// Non-living object (item, arrow, minecart...) with its network type id.
    Object(i8),
}

/// Behavior flags decoded from the metadata bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityFlags {
    pub on_fire: bool,
    pub crouching: bool,
    pub sprinting: bool,
    pub using_item: bool,
}

impl EntityFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            on_fire: bits & flag::ON_FIRE != 0,
            crouching: bits & flag::CROUCHING != 0,
            sprinting: bits & flag::SPRINTING != 0,
            using_item: bits & flag::USING_ITEM != 0,
        }
    }

    /// Decode from a full metadata list; a missing flag entry means no flags.
    pub fn from_metadata(entries: &[MetadataEntry]) -> Self {
        entity_metadata::find(entries, key::FLAGS)
            .and_then(|e| e.value.as_i64())
            .map(|bits| Self::from_bits(bits as u8))
            .unwrap_or_default()
    }
}

/// Health carried in a metadata list, if any.
pub fn health_from_metadata(entries: &[MetadataEntry]) -> Option<f32> {
    entity_metadata::find(entries, key::HEALTH)
        .and_then(|e| e.value.as_f64())
        .map(|h| h as f32)
}

/// An active potion effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub amplifier: i8,
    pub duration: i32,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: i32,
    /// Stable identity; only player entities carry one.
    pub uuid: Option<Uuid>,
    pub kind: EntityKind,
    pub position: Vec3,
    /// Position before the most recent movement update.
    pub last_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub head_yaw: f32,
    pub on_ground: bool,
    pub flags: EntityFlags,
    pub metadata: Vec<MetadataEntry>,
    pub held_item: Slot,
    pub equipment: [Slot; EQUIPMENT_SLOTS],
    pub effects: HashMap<i8, Effect>,
    pub health: Option<f32>,
    pub last_damaged: Option<Instant>,
}

impl Entity {
    pub fn new(id: i32, kind: EntityKind, position: Vec3) -> Self {
        Self {
            id,
            uuid: None,
            kind,
            position,
            last_position: position,
            yaw: 0.0,
            pitch: 0.0,
            head_yaw: 0.0,
            on_ground: false,
            flags: EntityFlags::default(),
            metadata: Vec::new(),
            held_item: Slot::Empty,
            equipment: Default::default(),
            effects: HashMap::new(),
            health: None,
            last_damaged: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Blocks per second over one tick of length `tick`.
    pub fn velocity(&self, tick: Duration) -> Vec3 {
        let secs = tick.as_secs_f64();
        if secs == 0.0 {
            return Vec3::ZERO;
        }
        (self.position - self.last_position) * (1.0 / secs)
    }

    /// Whether the entity was hurt within `window`.
    pub fn damaged_within(&self, window: Duration) -> bool {
        self.last_damaged.is_some_and(|t| t.elapsed() <= window)
    }

    /// Move to `position`, remembering the previous one.
    pub(crate) fn move_to(&mut self, position: Vec3) {
        self.last_position = self.position;
        self.position = position;
    }

    /// Merge a partial metadata update and re-derive flags and health from
    /// the merged list.
    pub(crate) fn merge_metadata(&mut self, delta: &[MetadataEntry]) {
        entity_metadata::merge(&mut self.metadata, delta);
        self.flags = EntityFlags::from_metadata(&self.metadata);
        if let Some(health) = health_from_metadata(&self.metadata) {
            self.health = Some(health);
        }
    }

    fn with_orientation(mut self, yaw: i8, pitch: i8) -> Self {
        self.yaw = angle_to_degrees(yaw);
        self.pitch = angle_to_degrees(pitch);
        self.head_yaw = self.yaw;
        self
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub(crate) fn apply(state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
    match packet.name.as_str() {
        name::NAMED_ENTITY_SPAWN => {
            let spawn: NamedEntitySpawn = packet.parse()?;
            let mut entity = Entity::new(
                spawn.entity_id,
                EntityKind::Player,
                Vec3::from_fixed_point(spawn.x, spawn.y, spawn.z),
            )
            .with_orientation(spawn.yaw, spawn.pitch);
            entity.uuid = Some(spawn.player_uuid);
            if spawn.current_item > 0 {
                entity.held_item = Slot::of(spawn.current_item, 1);
                entity.equipment[0] = entity.held_item.clone();
            }
            entity.merge_metadata(&spawn.metadata);
            trace!(id = spawn.entity_id, uuid = %spawn.player_uuid, "player spawned");
            state.insert_entity(entity);
        }
        name::SPAWN_ENTITY_LIVING => {
            let spawn: SpawnEntityLiving = packet.parse()?;
            let mut entity = Entity::new(
                spawn.entity_id,
                EntityKind::Mob(spawn.mob_type),
                Vec3::from_fixed_point(spawn.x, spawn.y, spawn.z),
            )
            .with_orientation(spawn.yaw, spawn.pitch);
            entity.head_yaw = angle_to_degrees(spawn.head_pitch);
            entity.merge_metadata(&spawn.metadata);
            state.insert_entity(entity);
        }
        name::SPAWN_ENTITY => {
            let spawn: SpawnEntity = packet.parse()?;
            let entity = Entity::new(
                spawn.entity_id,
                EntityKind::Object(spawn.object_type),
                Vec3::from_fixed_point(spawn.x, spawn.y, spawn.z),
            )
            .with_orientation(spawn.yaw, spawn.pitch);
            state.insert_entity(entity);
        }
        name::ENTITY_DESTROY => {
            let destroy: EntityDestroy = packet.parse()?;
            for id in destroy.entity_ids {
                state.remove_entity(id);
            }
        }
        name::ENTITY_METADATA => {
            let update: EntityMetadata = packet.parse()?;
            match state.entity_mut(update.entity_id) {
                Some(entity) => entity.merge_metadata(&update.metadata),
                None => trace!(id = update.entity_id, "metadata for unknown entity"),
            }
        }
        name::ENTITY_EQUIPMENT => {
            let update: EntityEquipment = packet.parse()?;
            let Some(entity) = state.entity_mut(update.entity_id) else {
                return Ok(());
            };
            let Some(slot) = usize::try_from(update.slot)
                .ok()
                .and_then(|i| entity.equipment.get_mut(i))
            else {
                debug!(slot = update.slot, "equipment slot out of range");
                return Ok(());
            };
            *slot = update.item.clone();
            if update.slot == HELD_ITEM_SLOT {
                entity.held_item = update.item;
            }
        }
        name::ENTITY_EFFECT => {
            let effect: EntityEffect = packet.parse()?;
            if let Some(entity) = state.entity_mut(effect.entity_id) {
                entity.effects.insert(
                    effect.effect_id,
                    Effect {
                        amplifier: effect.amplifier,
                        duration: effect.duration,
                    },
                );
            }
        }
        name::REMOVE_ENTITY_EFFECT => {
            let effect: RemoveEntityEffect = packet.parse()?;
            if let Some(entity) = state.entity_mut(effect.entity_id) {
                entity.effects.remove(&effect.effect_id);
            }
        }
        name::ENTITY_STATUS => {
            let update: EntityStatus = packet.parse()?;
            if update.entity_status == status::HURT {
                if let Some(entity) = state.entity_mut(update.entity_id) {
                    entity.last_damaged = Some(Instant::now());
                }
            }
        }
        other => trace!(packet = other, "not an entity lifecycle packet"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_proto::Direction;
    use serde_json::json;

    fn to_client(name: &str, fields: serde_json::Value) -> Packet {
        Packet::new(name, Direction::ToClient, fields)
    }

    fn spawn_player(state: &mut ShadowState, id: i32, uuid: &str) {
        apply(
            state,
            &to_client(
                name::NAMED_ENTITY_SPAWN,
                json!({
                    "entityId": id, "playerUUID": uuid,
                    "x": 0, "y": 64 * 32, "z": 0, "yaw": 0, "pitch": 0,
                    "currentItem": 276,
                    "metadata": [{"key": 0, "type": 0, "value": 1}, {"key": 6, "type": 3, "value": 20.0}]
                }),
            ),
        )
        .unwrap();
    }

    const UUID_A: &str = "00000000-0000-0000-0000-00000000000a";

    #[test]
    fn flags_decode_bits() {
        let flags = EntityFlags::from_bits(0x01 | 0x02 | 0x08 | 0x10);
        assert!(flags.on_fire && flags.crouching && flags.sprinting && flags.using_item);
        let flags = EntityFlags::from_bits(0x08);
        assert!(flags.sprinting && !flags.crouching && !flags.on_fire);
        assert_eq!(EntityFlags::from_metadata(&[]), EntityFlags::default());
    }

    #[test]
    fn flags_accept_signed_bytes() {
        // 0x92 read as a signed byte.
        let flags = EntityFlags::from_metadata(&[MetadataEntry::new(0, 0, json!(-110))]);
        assert!(flags.crouching && flags.using_item);
        assert!(!flags.on_fire && !flags.sprinting);
    }

    #[test]
    fn spawn_decodes_initial_state() {
        let mut state = ShadowState::new();
        spawn_player(&mut state, 5, UUID_A);
        let e = state.entity(5).unwrap();
        assert_eq!(e.position, Vec3::new(0.0, 64.0, 0.0));
        assert!(e.flags.on_fire);
        assert_eq!(e.health, Some(20.0));
        assert_eq!(e.held_item.item_id(), Some(276));
        assert_eq!(state.entity_by_uuid(&UUID_A.parse().unwrap()).map(|e| e.id), Some(5));
    }

    #[test]
    fn metadata_rederives_from_merged_list() {
        let mut state = ShadowState::new();
        spawn_player(&mut state, 5, UUID_A);

        // Partial update carrying only health keeps the on-fire flag.
        apply(
            &mut state,
            &to_client(
                name::ENTITY_METADATA,
                json!({"entityId": 5, "metadata": [{"key": 6, "type": 3, "value": 12.5}]}),
            ),
        )
        .unwrap();
        let e = state.entity(5).unwrap();
        assert!(e.flags.on_fire);
        assert_eq!(e.health, Some(12.5));

        apply(
            &mut state,
            &to_client(
                name::ENTITY_METADATA,
                json!({"entityId": 5, "metadata": [{"key": 0, "type": 0, "value": 2}]}),
            ),
        )
        .unwrap();
        let e = state.entity(5).unwrap();
        assert!(!e.flags.on_fire);
        assert!(e.flags.crouching);
        assert_eq!(e.metadata.len(), 2);
    }

    #[test]
    fn spawn_updates_destroy_clears_both_indices() {
        let mut state = ShadowState::new();
        spawn_player(&mut state, 5, UUID_A);
        for bits in [0, 2, 8, 16, 0] {
            apply(
                &mut state,
                &to_client(
                    name::ENTITY_METADATA,
                    json!({"entityId": 5, "metadata": [{"key": 0, "type": 0, "value": bits}]}),
                ),
            )
            .unwrap();
        }
        apply(
            &mut state,
            &to_client(name::ENTITY_DESTROY, json!({"entityIds": [5, 99]})),
        )
        .unwrap();
        assert!(state.entity(5).is_none());
        assert!(state.entity_by_uuid(&UUID_A.parse().unwrap()).is_none());
    }

    #[test]
    fn equipment_slot_zero_mirrors_held_item() {
        let mut state = ShadowState::new();
        spawn_player(&mut state, 5, UUID_A);
        apply(
            &mut state,
            &to_client(
                name::ENTITY_EQUIPMENT,
                json!({"entityId": 5, "slot": 0, "item": {"blockId": 261, "itemCount": 1, "itemDamage": 0}}),
            ),
        )
        .unwrap();
        apply(
            &mut state,
            &to_client(
                name::ENTITY_EQUIPMENT,
                json!({"entityId": 5, "slot": 4, "item": {"blockId": 310, "itemCount": 1, "itemDamage": 0}}),
            ),
        )
        .unwrap();
        let e = state.entity(5).unwrap();
        assert_eq!(e.held_item.item_id(), Some(261));
        assert_eq!(e.equipment[4].item_id(), Some(310));

        // Out-of-range slot is ignored.
        apply(
            &mut state,
            &to_client(
                name::ENTITY_EQUIPMENT,
                json!({"entityId": 5, "slot": 9, "item": {"blockId": -1}}),
            ),
        )
        .unwrap();
    }

    #[test]
    fn effects_and_hurt_status() {
        let mut state = ShadowState::new();
        spawn_player(&mut state, 5, UUID_A);
        apply(
            &mut state,
            &to_client(
                name::ENTITY_EFFECT,
                json!({"entityId": 5, "effectId": 1, "amplifier": 1, "duration": 600, "hideParticles": false}),
            ),
        )
        .unwrap();
        assert_eq!(
            state.entity(5).unwrap().effects.get(&1),
            Some(&Effect { amplifier: 1, duration: 600 })
        );
        apply(
            &mut state,
            &to_client(name::REMOVE_ENTITY_EFFECT, json!({"entityId": 5, "effectId": 1})),
        )
        .unwrap();
        assert!(state.entity(5).unwrap().effects.is_empty());

        assert!(state.entity(5).unwrap().last_damaged.is_none());
        apply(
            &mut state,
            &to_client(name::ENTITY_STATUS, json!({"entityId": 5, "entityStatus": 2})),
        )
        .unwrap();
        assert!(state.entity(5).unwrap().damaged_within(Duration::from_secs(5)));
    }

    #[test]
    fn mob_and_object_spawns() {
        let mut state = ShadowState::new();
        apply(
            &mut state,
            &to_client(
                name::SPAWN_ENTITY_LIVING,
                json!({"entityId": 7, "type": 54, "x": 32, "y": 0, "z": 0, "yaw": 0, "pitch": 0, "headPitch": 0, "metadata": []}),
            ),
        )
        .unwrap();
        apply(
            &mut state,
            &to_client(
                name::SPAWN_ENTITY,
                json!({"entityId": 8, "type": 2, "x": 0, "y": 0, "z": 0, "pitch": 0, "yaw": 0}),
            ),
        )
        .unwrap();
        assert_eq!(state.entity(7).unwrap().kind, EntityKind::Mob(54));
        assert_eq!(state.entity(7).unwrap().position.x, 1.0);
        assert_eq!(state.entity(8).unwrap().kind, EntityKind::Object(2));
        assert!(state.entity(8).unwrap().uuid.is_none());
    }

    #[test]
    fn malformed_packet_is_error_without_mutation() {
        let mut state = ShadowState::new();
        let err = apply(
            &mut state,
            &to_client(name::NAMED_ENTITY_SPAWN, json!({"entityId": "five"})),
        );
        assert!(err.is_err());
        assert_eq!(state.entity_count(), 0);
    }

    #[test]
    fn velocity_from_last_position() {
        let mut e = Entity::new(1, EntityKind::Mob(50), Vec3::ZERO);
        e.move_to(Vec3::new(0.5, 0.0, 0.0));
        let v = e.velocity(Duration::from_millis(50));
        assert!((v.x - 10.0).abs() < 1e-9);
        assert_eq!(e.velocity(Duration::ZERO), Vec3::ZERO);
    }
}
