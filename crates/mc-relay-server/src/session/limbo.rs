//! Packets for the placeholder world and for moving a client between worlds.
//!
//! A client that reached Play never sees a second `login`. Moving it into
//! limbo, or from limbo onto a real server, goes through a pair of
//! `respawn` packets instead, the first aimed at a different dimension so
//! the client actually unloads its world.

use mc_relay_proto::packets::{
    name, KeepAlive, Login, LoginSuccess, Respawn, ScoreboardObjective, ScoreboardTeam,
    ServerPosition,
};
use mc_relay_proto::packets::player_info::action as player_info;
use mc_relay_proto::packets::scoreboard_objective::action as objective;
use mc_relay_proto::packets::scoreboard_team::mode as team;
use mc_relay_proto::packets::{PlayerInfo, PlayerInfoEntry};
use mc_relay_proto::types::Uuid;
use mc_relay_proto::{Direction, Packet, ProtoError};
use mc_relay_state::ShadowState;

use crate::dispatcher::system_chat;

/// Entity id the client is given while in limbo.
pub const LIMBO_ENTITY_ID: i32 = 1;

/// Height the client is placed at in limbo.
const LIMBO_Y: f64 = 64.0;

/// Login-state `success` completing the client's login without an upstream.
pub fn login_success(username: &str) -> Result<Packet, ProtoError> {
    Packet::from_fields(
        name::LOGIN_SUCCESS,
        Direction::ToClient,
        &LoginSuccess {
            uuid: Uuid::NIL.to_string(),
            username: username.to_string(),
        },
    )
}

/// Play-state packets that put the client into limbo and tell it why.
///
/// `in_play` selects between a first join and a switch out of a world the
/// client already has loaded.
pub fn enter(in_play: bool, message: &str) -> Result<Vec<Packet>, ProtoError> {
    let world = Login::limbo(LIMBO_ENTITY_ID);
    let mut packets = if in_play {
        respawn_into(&world)?
    } else {
        vec![Packet::from_fields(name::LOGIN, Direction::ToClient, &world)?]
    };
    packets.push(Packet::from_fields(
        name::POSITION,
        Direction::ToClient,
        &ServerPosition {
            x: 0.0,
            y: LIMBO_Y,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            flags: 0,
        },
    )?);
    packets.push(system_chat(message));
    Ok(packets)
}

/// Keep-alive with a fresh random id.
pub fn keep_alive() -> Result<Packet, ProtoError> {
    Packet::from_fields(
        name::KEEP_ALIVE,
        Direction::ToClient,
        &KeepAlive {
            keep_alive_id: rand::random::<i32>(),
        },
    )
}

/// Respawn pair moving a client that is already in Play into `world`.
pub fn respawn_into(world: &Login) -> Result<Vec<Packet>, ProtoError> {
    let target = i32::from(world.dimension);
    // Any other dimension forces the client to drop what it has loaded.
    let detour = if target == 0 { -1 } else { 0 };
    [detour, target]
        .into_iter()
        .map(|dimension| {
            Packet::from_fields(
                name::RESPAWN,
                Direction::ToClient,
                &Respawn {
                    dimension,
                    difficulty: world.difficulty,
                    gamemode: world.game_mode & 0x7,
                    level_type: world.level_type.clone(),
                },
            )
        })
        .collect()
}

/// Removals for every tab entry, team and objective the client was shown,
/// so the next server starts from an empty client-side scoreboard.
pub fn clear_client_lists(state: &ShadowState) -> Result<Vec<Packet>, ProtoError> {
    let mut packets = Vec::new();

    let entries: Vec<PlayerInfoEntry> = state
        .tab_entries()
        .map(|tab| PlayerInfoEntry {
            uuid: tab.uuid,
            name: None,
            gamemode: None,
            ping: None,
            display_name: None,
        })
        .collect();
    if !entries.is_empty() {
        packets.push(Packet::from_fields(
            name::PLAYER_INFO,
            Direction::ToClient,
            &PlayerInfo {
                action: player_info::REMOVE_PLAYER,
                data: entries,
            },
        )?);
    }

    for t in state.teams() {
        packets.push(Packet::from_fields(
            name::SCOREBOARD_TEAM,
            Direction::ToClient,
            &ScoreboardTeam {
                team: t.name.clone(),
                mode: team::REMOVE,
                name: None,
                prefix: None,
                suffix: None,
                friendly_fire: None,
                name_tag_visibility: None,
                color: None,
                players: None,
            },
        )?);
    }

    for o in state.objectives() {
        packets.push(Packet::from_fields(
            name::SCOREBOARD_OBJECTIVE,
            Direction::ToClient,
            &ScoreboardObjective {
                name: o.name.clone(),
                action: objective::REMOVE,
                display_text: None,
                kind: None,
            },
        )?);
    }
    Ok(packets)
}
