//! `scoreboard_objective`: Server → Client.

use serde::{Deserialize, Serialize};

/// Values of [`ScoreboardObjective::action`].
pub mod action {
    pub const CREATE: i8 = 0;
    pub const REMOVE: i8 = 1;
    pub const UPDATE: i8 = 2;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardObjective {
    pub name: String,
    pub action: i8,
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}
