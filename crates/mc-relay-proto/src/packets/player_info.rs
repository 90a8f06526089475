//! `player_info`: Server → Client. Tab-list maintenance.
//!
//! One packet carries a single action applied to every entry in `data`.
//! Which optional fields are present depends on the action.

use serde::{Deserialize, Serialize};

use crate::types::Uuid;

/// Values of [`PlayerInfo::action`].
pub mod action {
    pub const ADD_PLAYER: i32 = 0;
    pub const UPDATE_GAMEMODE: i32 = 1;
    pub const UPDATE_LATENCY: i32 = 2;
    pub const UPDATE_DISPLAY_NAME: i32 = 3;
    pub const REMOVE_PLAYER: i32 = 4;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfoEntry {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamemode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<i32>,
    /// JSON chat component overriding the tab-list name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub action: i32,
    pub data: Vec<PlayerInfoEntry>,
}
