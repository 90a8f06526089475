//! Typed field layouts for the packets the relay understands.
//!
//! Each struct deserializes from the decoded `fields` of a [`crate::Packet`].
//! Packets not listed here are forwarded untouched.

pub mod chat_message;
pub mod close_window;
pub mod entity_action;
pub mod entity_destroy;
pub mod entity_effect;
pub mod entity_equipment;
pub mod entity_look;
pub mod entity_metadata;
pub mod entity_status;
pub mod entity_teleport;
pub mod handshake;
pub mod held_item_slot;
pub mod keep_alive;
pub mod kick_disconnect;
pub mod login;
pub mod named_entity_spawn;
pub mod open_window;
pub mod player_info;
pub mod player_movement;
pub mod rel_entity_move;
pub mod respawn;
pub mod scoreboard_objective;
pub mod scoreboard_score;
pub mod scoreboard_team;
pub mod set_slot;
pub mod spawn_entity;
pub mod spawn_entity_living;
pub mod transaction;
pub mod update_health;
pub mod use_entity;
pub mod window_click;
pub mod window_items;

pub use chat_message::ChatMessage;
pub use close_window::CloseWindow;
pub use entity_action::EntityAction;
pub use entity_destroy::EntityDestroy;
pub use entity_effect::{EntityEffect, RemoveEntityEffect};
pub use entity_equipment::EntityEquipment;
pub use entity_look::{EntityHeadRotation, EntityLook, EntityMoveLook};
pub use entity_metadata::{EntityMetadata, MetadataEntry};
pub use entity_status::EntityStatus;
pub use entity_teleport::EntityTeleport;
pub use handshake::{LoginDisconnect, LoginStart, LoginSuccess, SetProtocol};
pub use held_item_slot::{HeldItemSlotToClient, HeldItemSlotToServer};
pub use keep_alive::KeepAlive;
pub use kick_disconnect::KickDisconnect;
pub use login::Login;
pub use named_entity_spawn::NamedEntitySpawn;
pub use open_window::OpenWindow;
pub use player_info::{PlayerInfo, PlayerInfoEntry};
pub use player_movement::{ClientMovement, ServerPosition};
pub use rel_entity_move::RelEntityMove;
pub use respawn::Respawn;
pub use scoreboard_objective::ScoreboardObjective;
pub use scoreboard_score::ScoreboardScore;
pub use scoreboard_team::ScoreboardTeam;
pub use set_slot::SetSlot;
pub use spawn_entity::SpawnEntity;
pub use spawn_entity_living::SpawnEntityLiving;
pub use transaction::Transaction;
pub use update_health::UpdateHealth;
pub use use_entity::UseEntity;
pub use window_click::WindowClick;
pub use window_items::WindowItems;

/// Packet names as produced by the codec.
pub mod name {
    // Handshaking / Login
    pub const SET_PROTOCOL: &str = "set_protocol";
    pub const LOGIN_START: &str = "login_start";
    pub const LOGIN_SUCCESS: &str = "success";
    pub const LOGIN_DISCONNECT: &str = "disconnect";
    pub const ENCRYPTION_BEGIN: &str = "encryption_begin";
    pub const COMPRESS: &str = "compress";

    // Play, both directions
    pub const CHAT: &str = "chat";
    pub const KEEP_ALIVE: &str = "keep_alive";
    pub const CLOSE_WINDOW: &str = "close_window";
    pub const TRANSACTION: &str = "transaction";
    pub const HELD_ITEM_SLOT: &str = "held_item_slot";
    pub const POSITION: &str = "position";

    // Play, to client
    pub const LOGIN: &str = "login";
    pub const RESPAWN: &str = "respawn";
    pub const UPDATE_HEALTH: &str = "update_health";
    pub const NAMED_ENTITY_SPAWN: &str = "named_entity_spawn";
    pub const SPAWN_ENTITY_LIVING: &str = "spawn_entity_living";
    pub const SPAWN_ENTITY: &str = "spawn_entity";
    pub const ENTITY_DESTROY: &str = "entity_destroy";
    pub const ENTITY_METADATA: &str = "entity_metadata";
    pub const ENTITY_EQUIPMENT: &str = "entity_equipment";
    pub const ENTITY_EFFECT: &str = "entity_effect";
    pub const REMOVE_ENTITY_EFFECT: &str = "remove_entity_effect";
    pub const ENTITY_STATUS: &str = "entity_status";
    pub const ENTITY_TELEPORT: &str = "entity_teleport";
    pub const REL_ENTITY_MOVE: &str = "rel_entity_move";
    pub const ENTITY_LOOK: &str = "entity_look";
    pub const ENTITY_MOVE_LOOK: &str = "entity_move_look";
    pub const ENTITY_HEAD_ROTATION: &str = "entity_head_rotation";
    pub const PLAYER_INFO: &str = "player_info";
    pub const SCOREBOARD_TEAM: &str = "scoreboard_team";
    pub const SCOREBOARD_OBJECTIVE: &str = "scoreboard_objective";
    pub const SCOREBOARD_SCORE: &str = "scoreboard_score";
    pub const WINDOW_ITEMS: &str = "window_items";
    pub const SET_SLOT: &str = "set_slot";
    pub const OPEN_WINDOW: &str = "open_window";
    pub const KICK_DISCONNECT: &str = "kick_disconnect";
    pub const TITLE: &str = "title";
    pub const NAMED_SOUND_EFFECT: &str = "named_sound_effect";

    // Play, to server
    pub const FLYING: &str = "flying";
    pub const LOOK: &str = "look";
    pub const POSITION_LOOK: &str = "position_look";
    pub const WINDOW_CLICK: &str = "window_click";
    pub const USE_ENTITY: &str = "use_entity";
    pub const ARM_ANIMATION: &str = "arm_animation";
    pub const ENTITY_ACTION: &str = "entity_action";
}
