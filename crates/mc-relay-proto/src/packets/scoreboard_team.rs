//! `scoreboard_team`: Server → Client.

use serde::{Deserialize, Serialize};

/// Values of [`ScoreboardTeam::mode`].
pub mod mode {
    pub const CREATE: i8 = 0;
    pub const REMOVE: i8 = 1;
    pub const UPDATE: i8 = 2;
    pub const ADD_PLAYERS: i8 = 3;
    pub const REMOVE_PLAYERS: i8 = 4;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardTeam {
    pub team: String,
    pub mode: i8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub friendly_fire: Option<i8>,
    #[serde(default)]
    pub name_tag_visibility: Option<String>,
    #[serde(default)]
    pub color: Option<i8>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
}
