//! Movement handler: entity teleports, relative moves, look updates, and the
//! local player's own position.

use mc_relay_proto::packets::player_movement::relative;
use mc_relay_proto::packets::{
    name, ClientMovement, EntityHeadRotation, EntityLook, EntityMoveLook, EntityTeleport,
    RelEntityMove, ServerPosition,
};
use mc_relay_proto::types::{angle_to_degrees, from_fixed_point, Vec3};
use mc_relay_proto::{Direction, Packet, ProtoError};
use tracing::trace;

use crate::entity::Entity;
use crate::store::ShadowState;

fn delta(dx: i8, dy: i8, dz: i8) -> Vec3 {
    Vec3::new(
        from_fixed_point(dx as i32),
        from_fixed_point(dy as i32),
        from_fixed_point(dz as i32),
    )
}

fn look(entity: &mut Entity, yaw: i8, pitch: i8) {
    entity.yaw = angle_to_degrees(yaw);
    entity.pitch = angle_to_degrees(pitch);
}

fn with_entity(
    state: &mut ShadowState,
    id: i32,
    f: impl FnOnce(&mut Entity),
) -> Result<(), ProtoError> {
    match state.entity_mut(id) {
        Some(entity) => f(entity),
        None => trace!(id, "movement for unknown entity"),
    }
    Ok(())
}

pub(crate) fn apply(state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
    match (packet.direction, packet.name.as_str()) {
        (Direction::ToClient, name::ENTITY_TELEPORT) => {
            let tp: EntityTeleport = packet.parse()?;
            with_entity(state, tp.entity_id, |e| {
                e.move_to(Vec3::from_fixed_point(tp.x, tp.y, tp.z));
                look(e, tp.yaw, tp.pitch);
                if let Some(on_ground) = tp.on_ground {
                    e.on_ground = on_ground;
                }
            })
        }
        (Direction::ToClient, name::REL_ENTITY_MOVE) => {
            let mv: RelEntityMove = packet.parse()?;
            with_entity(state, mv.entity_id, |e| {
                e.move_to(e.position + delta(mv.dx, mv.dy, mv.dz));
                if let Some(on_ground) = mv.on_ground {
                    e.on_ground = on_ground;
                }
            })
        }
        (Direction::ToClient, name::ENTITY_LOOK) => {
            let lk: EntityLook = packet.parse()?;
            with_entity(state, lk.entity_id, |e| {
                e.move_to(e.position);
                look(e, lk.yaw, lk.pitch);
                if let Some(on_ground) = lk.on_ground {
                    e.on_ground = on_ground;
                }
            })
        }
        (Direction::ToClient, name::ENTITY_MOVE_LOOK) => {
            let mv: EntityMoveLook = packet.parse()?;
            with_entity(state, mv.entity_id, |e| {
                e.move_to(e.position + delta(mv.dx, mv.dy, mv.dz));
                look(e, mv.yaw, mv.pitch);
                if let Some(on_ground) = mv.on_ground {
                    e.on_ground = on_ground;
                }
            })
        }
        (Direction::ToClient, name::ENTITY_HEAD_ROTATION) => {
            let rot: EntityHeadRotation = packet.parse()?;
            with_entity(state, rot.entity_id, |e| {
                e.head_yaw = angle_to_degrees(rot.head_yaw);
            })
        }
        (Direction::ToClient, name::POSITION) => {
            let pos: ServerPosition = packet.parse()?;
            let local = &mut state.local;
            let axis = |bit, current: f64, value: f64| {
                if pos.is_relative(bit) {
                    current + value
                } else {
                    value
                }
            };
            let next = Vec3::new(
                axis(relative::X, local.position.x, pos.x),
                axis(relative::Y, local.position.y, pos.y),
                axis(relative::Z, local.position.z, pos.z),
            );
            let yaw = axis(relative::YAW, local.yaw as f64, pos.yaw as f64) as f32;
            let pitch = axis(relative::PITCH, local.pitch as f64, pos.pitch as f64) as f32;
            local.move_to(next);
            local.yaw = yaw;
            local.pitch = pitch;
            Ok(())
        }
        (
            Direction::ToServer,
            name::FLYING | name::POSITION | name::LOOK | name::POSITION_LOOK,
        ) => {
            let mv: ClientMovement = packet.parse()?;
            let local = &mut state.local;
            let next = Vec3::new(
                mv.x.unwrap_or(local.position.x),
                mv.y.unwrap_or(local.position.y),
                mv.z.unwrap_or(local.position.z),
            );
            local.move_to(next);
            if let Some(yaw) = mv.yaw {
                local.yaw = yaw;
            }
            if let Some(pitch) = mv.pitch {
                local.pitch = pitch;
            }
            local.on_ground = mv.on_ground;
            Ok(())
        }
        (_, other) => {
            trace!(packet = other, "not a movement packet");
            Ok(())
        }
    }
}
