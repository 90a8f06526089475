//! Team and scoreboard records and their handler.

use std::collections::{BTreeSet, HashMap};

use mc_relay_proto::packets::scoreboard_team::mode;
use mc_relay_proto::packets::{
    name, scoreboard_objective, scoreboard_score, ScoreboardObjective, ScoreboardScore,
    ScoreboardTeam,
};
use mc_relay_proto::{Packet, ProtoError};
use tracing::{debug, trace};

use crate::store::ShadowState;

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub display_name: String,
    pub prefix: String,
    pub suffix: String,
    /// Chat color index, -1 for none.
    pub color: i8,
    pub friendly_fire: i8,
    pub name_tag_visibility: String,
    pub members: BTreeSet<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            prefix: String::new(),
            suffix: String::new(),
            color: -1,
            friendly_fire: 0,
            name_tag_visibility: "always".into(),
            members: BTreeSet::new(),
        }
    }

    fn update_metadata(&mut self, packet: &ScoreboardTeam) {
        if let Some(display_name) = &packet.name {
            self.display_name = display_name.clone();
        }
        if let Some(prefix) = &packet.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(suffix) = &packet.suffix {
            self.suffix = suffix.clone();
        }
        if let Some(friendly_fire) = packet.friendly_fire {
            self.friendly_fire = friendly_fire;
        }
        if let Some(visibility) = &packet.name_tag_visibility {
            self.name_tag_visibility = visibility.clone();
        }
        if let Some(color) = packet.color {
            self.color = color;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub name: String,
    pub display_text: String,
    /// Render type, `integer` or `hearts`.
    pub kind: String,
    pub scores: HashMap<String, i32>,
}

impl Objective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_text: String::new(),
            kind: "integer".into(),
            scores: HashMap::new(),
        }
    }
}

/// Add members to `team`, removing them from any other team first.
fn add_members(state: &mut ShadowState, team: &str, players: &[String]) {
    for other in state.teams.values_mut().filter(|t| t.name != team) {
        for player in players {
            other.members.remove(player);
        }
    }
    if let Some(t) = state.teams.get_mut(team) {
        t.members.extend(players.iter().cloned());
    }
}

pub(crate) fn apply(state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
    match packet.name.as_str() {
        name::SCOREBOARD_TEAM => {
            let update: ScoreboardTeam = packet.parse()?;
            let players = update.players.clone().unwrap_or_default();
            match update.mode {
                mode::CREATE => {
                    let mut team = Team::new(update.team.clone());
                    team.update_metadata(&update);
                    state.teams.insert(update.team.clone(), team);
                    add_members(state, &update.team, &players);
                }
                mode::REMOVE => {
                    state.teams.remove(&update.team);
                }
                mode::UPDATE => match state.teams.get_mut(&update.team) {
                    Some(team) => team.update_metadata(&update),
                    None => trace!(team = %update.team, "update for unknown team"),
                },
                mode::ADD_PLAYERS => add_members(state, &update.team, &players),
                mode::REMOVE_PLAYERS => {
                    if let Some(team) = state.teams.get_mut(&update.team) {
                        for player in &players {
                            team.members.remove(player);
                        }
                    }
                }
                other => debug!(mode = other, "unknown team mode"),
            }
        }
        name::SCOREBOARD_OBJECTIVE => {
            let update: ScoreboardObjective = packet.parse()?;
            match update.action {
                scoreboard_objective::action::REMOVE => {
                    state.objectives.remove(&update.name);
                }
                action => {
                    let objective = state
                        .objectives
                        .entry(update.name.clone())
                        .or_insert_with(|| Objective::new(update.name.clone()));
                    if let Some(text) = update.display_text {
                        objective.display_text = text;
                    }
                    if let Some(kind) = update.kind {
                        objective.kind = kind;
                    }
                    trace!(action, objective = %update.name, "objective updated");
                }
            }
        }
        name::SCOREBOARD_SCORE => {
            let update: ScoreboardScore = packet.parse()?;
            match update.action {
                scoreboard_score::action::REMOVE => {
                    // An empty objective name removes the entry from every objective.
                    if update.score_name.is_empty() {
                        for objective in state.objectives.values_mut() {
                            objective.scores.remove(&update.item_name);
                        }
                    } else if let Some(objective) = state.objectives.get_mut(&update.score_name) {
                        objective.scores.remove(&update.item_name);
                    }
                }
                _ => match state.objectives.get_mut(&update.score_name) {
                    Some(objective) => {
                        objective
                            .scores
                            .insert(update.item_name, update.value.unwrap_or(0));
                    }
                    None => trace!(objective = %update.score_name, "score for unknown objective"),
                },
            }
        }
        other => trace!(packet = other, "not a team packet"),
    }
    Ok(())
}
