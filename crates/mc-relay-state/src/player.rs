//! Local player, login, health and tab-list handling.

use mc_relay_proto::packets::entity_action::action as entity_action;
use mc_relay_proto::packets::player_info::action;
use mc_relay_proto::packets::{
    name, EntityAction, HeldItemSlotToClient, HeldItemSlotToServer, Login, LoginSuccess,
    PlayerInfo, Respawn, UpdateHealth,
};
use mc_relay_proto::types::{Uuid, Vec3};
use mc_relay_proto::{Direction, Packet, ProtoError};
use tracing::{debug, trace};

use crate::store::ShadowState;

/// Number of hotbar slots.
pub const HOTBAR_SLOTS: u8 = 9;

/// Gamemode value for creative.
pub const GAMEMODE_CREATIVE: u8 = 1;

/// The player behind the relayed client connection.
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub entity_id: i32,
    pub username: String,
    pub uuid: Option<Uuid>,
    pub gamemode: u8,
    pub dimension: i32,
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
    pub position: Vec3,
    pub last_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub crouching: bool,
    pub sprinting: bool,
    /// Selected hotbar slot, 0..9.
    pub held_slot: u8,
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self {
            entity_id: 0,
            username: String::new(),
            uuid: None,
            gamemode: 0,
            dimension: 0,
            health: 20.0,
            food: 20,
            saturation: 5.0,
            position: Vec3::ZERO,
            last_position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            crouching: false,
            sprinting: false,
            held_slot: 0,
        }
    }
}

impl LocalPlayer {
    pub fn is_creative(&self) -> bool {
        self.gamemode == GAMEMODE_CREATIVE
    }

    pub(crate) fn move_to(&mut self, position: Vec3) {
        self.last_position = self.position;
        self.position = position;
    }
}

/// One tab-list row.
#[derive(Debug, Clone, PartialEq)]
pub struct TabEntry {
    pub uuid: Uuid,
    pub name: String,
    /// JSON chat component overriding the raw name.
    pub display_name: Option<String>,
    pub gamemode: i32,
    pub ping: i32,
}

pub(crate) fn apply(state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
    match (packet.direction, packet.name.as_str()) {
        (Direction::ToClient, name::LOGIN_SUCCESS) => {
            let success: LoginSuccess = packet.parse()?;
            state.local.username = success.username;
            state.local.uuid = success.uuid.parse().ok();
        }
        (Direction::ToClient, name::LOGIN) => {
            let login: Login = packet.parse()?;
            state.local.entity_id = login.entity_id;
            state.local.gamemode = login.game_mode & 0x7;
            state.local.dimension = login.dimension as i32;
            debug!(entity_id = login.entity_id, gamemode = login.game_mode, "joined world");
            state.last_login = Some(login);
        }
        (Direction::ToClient, name::RESPAWN) => {
            let respawn: Respawn = packet.parse()?;
            state.reset_for_respawn();
            state.local.gamemode = respawn.gamemode & 0x7;
            state.local.dimension = respawn.dimension;
        }
        (Direction::ToClient, name::UPDATE_HEALTH) => {
            let health: UpdateHealth = packet.parse()?;
            state.local.health = health.health;
            state.local.food = health.food;
            state.local.saturation = health.food_saturation;
        }
        (Direction::ToClient, name::HELD_ITEM_SLOT) => {
            let held: HeldItemSlotToClient = packet.parse()?;
            set_held_slot(state, held.slot as i16);
        }
        (Direction::ToServer, name::HELD_ITEM_SLOT) => {
            let held: HeldItemSlotToServer = packet.parse()?;
            set_held_slot(state, held.slot_id);
        }
        (Direction::ToServer, name::ENTITY_ACTION) => {
            let act: EntityAction = packet.parse()?;
            match act.action_id {
                entity_action::START_SNEAKING => state.local.crouching = true,
                entity_action::STOP_SNEAKING => state.local.crouching = false,
                entity_action::START_SPRINTING => state.local.sprinting = true,
                entity_action::STOP_SPRINTING => state.local.sprinting = false,
                _ => {}
            }
        }
        (Direction::ToClient, name::PLAYER_INFO) => {
            let info: PlayerInfo = packet.parse()?;
            apply_player_info(state, info);
        }
        (_, other) => trace!(packet = other, "not a player packet"),
    }
    Ok(())
}

fn set_held_slot(state: &mut ShadowState, slot: i16) {
    match u8::try_from(slot) {
        Ok(slot) if slot < HOTBAR_SLOTS => state.local.held_slot = slot,
        _ => debug!(slot, "held slot out of range"),
    }
}

fn apply_player_info(state: &mut ShadowState, info: PlayerInfo) {
    for entry in info.data {
        match info.action {
            action::ADD_PLAYER => {
                let tab = TabEntry {
                    uuid: entry.uuid,
                    name: entry.name.unwrap_or_default(),
                    display_name: entry.display_name,
                    gamemode: entry.gamemode.unwrap_or(0),
                    ping: entry.ping.unwrap_or(0),
                };
                state.tab_list.insert(entry.uuid, tab);
            }
            action::REMOVE_PLAYER => {
                state.tab_list.remove(&entry.uuid);
            }
            update => {
                let Some(tab) = state.tab_list.get_mut(&entry.uuid) else {
                    trace!(uuid = %entry.uuid, "update for unlisted player");
                    continue;
                };
                match update {
                    action::UPDATE_GAMEMODE => tab.gamemode = entry.gamemode.unwrap_or(tab.gamemode),
                    action::UPDATE_LATENCY => tab.ping = entry.ping.unwrap_or(tab.ping),
                    action::UPDATE_DISPLAY_NAME => tab.display_name = entry.display_name,
                    other => debug!(action = other, "unknown player_info action"),
                }
            }
        }
    }
}
