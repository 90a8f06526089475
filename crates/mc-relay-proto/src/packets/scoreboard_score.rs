//! `scoreboard_score`: Server → Client.

use serde::{Deserialize, Serialize};

/// Values of [`ScoreboardScore::action`].
pub mod action {
    pub const UPDATE: i8 = 0;
    pub const REMOVE: i8 = 1;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardScore {
    /// Entry name (usually a player name).
    pub item_name: String,
    pub action: i8,
    /// Objective name. Empty on removal means "every objective".
    pub score_name: String,
    #[serde(default)]
    pub value: Option<i32>,
}
