//! The shadow state store.

use std::collections::HashMap;

use mc_relay_proto::chat;
use mc_relay_proto::packets::Login;
use mc_relay_proto::types::{Uuid, Vec3};

use crate::entity::{Entity, EntityKind};
use crate::inventory::Inventory;
use crate::player::{LocalPlayer, TabEntry};
use crate::team::{Objective, Team};

/// A display-name override installed by an extension.
#[derive(Debug, Clone, PartialEq)]
struct NameOverride {
    owner: u32,
    name: String,
}

/// A player as seen through the tab list, the live entity, or both.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRecord<'a> {
    pub uuid: Uuid,
    pub tab: Option<&'a TabEntry>,
    pub entity: Option<&'a Entity>,
}

impl PlayerRecord<'_> {
    /// Raw player name, if the tab list has announced it.
    pub fn name(&self) -> Option<&str> {
        self.tab.map(|t| t.name.as_str())
    }
}

/// Mirror of world, entity, tab-list, team and inventory state.
///
/// Both entity indices (by numeric handle and by stable identity) are only
/// ever changed together through [`ShadowState::insert_entity`] and
/// [`ShadowState::remove_entity`].
#[derive(Debug, Default)]
pub struct ShadowState {
    pub(crate) entities: HashMap<i32, Entity>,
    pub(crate) entity_ids_by_uuid: HashMap<Uuid, i32>,
    pub(crate) tab_list: HashMap<Uuid, TabEntry>,
    pub(crate) teams: HashMap<String, Team>,
    pub(crate) objectives: HashMap<String, Objective>,
    pub(crate) inventory: Inventory,
    pub(crate) local: LocalPlayer,
    pub(crate) last_login: Option<Login>,
    name_overrides: HashMap<Uuid, NameOverride>,
}

impl ShadowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, including the remembered login.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reset for a respawn: everything goes except the most recent login
    /// packet and the local player's identity.
    pub fn reset_for_respawn(&mut self) {
        let last_login = self.last_login.take();
        let local = LocalPlayer {
            username: self.local.username.clone(),
            uuid: self.local.uuid,
            entity_id: self.local.entity_id,
            gamemode: self.local.gamemode,
            ..LocalPlayer::default()
        };
        self.reset();
        self.last_login = last_login;
        self.local = local;
    }

    // --- Entity index maintenance ---

    /// Register an entity under both indices, replacing any record that
    /// shares its handle or its stable identity.
    pub(crate) fn insert_entity(&mut self, entity: Entity) {
        self.remove_entity(entity.id);
        if let Some(uuid) = entity.uuid {
            if let Some(stale) = self.entity_ids_by_uuid.get(&uuid).copied() {
                self.remove_entity(stale);
            }
            self.entity_ids_by_uuid.insert(uuid, entity.id);
        }
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity from both indices.
    pub(crate) fn remove_entity(&mut self, id: i32) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if let Some(uuid) = entity.uuid {
            if self.entity_ids_by_uuid.get(&uuid) == Some(&id) {
                self.entity_ids_by_uuid.remove(&uuid);
            }
        }
        Some(entity)
    }

    pub(crate) fn entity_mut(&mut self, id: i32) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    // --- Read access ---

    pub fn entity(&self, id: i32) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_by_uuid(&self, uuid: &Uuid) -> Option<&Entity> {
        self.entity_ids_by_uuid
            .get(uuid)
            .and_then(|id| self.entities.get(id))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn tab_entry(&self, uuid: &Uuid) -> Option<&TabEntry> {
        self.tab_list.get(uuid)
    }

    pub fn tab_entries(&self) -> impl Iterator<Item = &TabEntry> {
        self.tab_list.values()
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn objective(&self, name: &str) -> Option<&Objective> {
        self.objectives.get(name)
    }

    pub fn objectives(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.values()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn local_player(&self) -> &LocalPlayer {
        &self.local
    }

    pub fn last_login(&self) -> Option<&Login> {
        self.last_login.as_ref()
    }

    // --- Derived queries ---

    /// Every known player: the tab list merged with live player entities.
    pub fn players(&self) -> Vec<PlayerRecord<'_>> {
        let mut records: Vec<PlayerRecord<'_>> = self
            .tab_list
            .values()
            .map(|tab| PlayerRecord {
                uuid: tab.uuid,
                tab: Some(tab),
                entity: self.entity_by_uuid(&tab.uuid),
            })
            .collect();
        for entity in self.entities.values() {
            if entity.kind != EntityKind::Player {
                continue;
            }
            if let Some(uuid) = entity.uuid {
                if !self.tab_list.contains_key(&uuid) {
                    records.push(PlayerRecord {
                        uuid,
                        tab: None,
                        entity: Some(entity),
                    });
                }
            }
        }
        records.sort_by_key(|r| r.uuid);
        records
    }

    pub fn player(&self, uuid: &Uuid) -> Option<PlayerRecord<'_>> {
        let tab = self.tab_list.get(uuid);
        let entity = self.entity_by_uuid(uuid);
        if tab.is_none() && entity.is_none() {
            return None;
        }
        Some(PlayerRecord {
            uuid: *uuid,
            tab,
            entity,
        })
    }

    /// Linear scan of the tab list by name (case-insensitive).
    pub fn player_by_name(&self, name: &str) -> Option<PlayerRecord<'_>> {
        self.tab_list
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .and_then(|t| self.player(&t.uuid))
    }

    /// Players with a live entity within `radius` of `center`.
    pub fn players_within(&self, center: Vec3, radius: f64) -> Vec<PlayerRecord<'_>> {
        self.players()
            .into_iter()
            .filter(|p| {
                p.entity
                    .is_some_and(|e| e.position.distance(&center) <= radius)
            })
            .collect()
    }

    /// Linear scan for the team containing `member`.
    pub fn team_of(&self, member: &str) -> Option<&Team> {
        self.teams.values().find(|t| t.members.contains(member))
    }

    /// Players sharing a team with `member`, excluding `member` itself.
    pub fn teammates(&self, member: &str) -> Vec<PlayerRecord<'_>> {
        let Some(team) = self.team_of(member) else {
            return Vec::new();
        };
        team.members
            .iter()
            .filter(|m| m.as_str() != member)
            .filter_map(|m| self.player_by_name(m))
            .collect()
    }

    /// Compose the name a client would render for a player.
    ///
    /// An extension override replaces the raw name; a tab-list display name
    /// replaces the raw name and team affixes; otherwise the raw name is
    /// wrapped in its team's prefix and suffix.
    pub fn formatted_display_name(&self, uuid: &Uuid) -> Option<String> {
        let tab = self.tab_list.get(uuid)?;
        let team = self.team_of(&tab.name);
        let (prefix, suffix) = team
            .map(|t| (t.prefix.as_str(), t.suffix.as_str()))
            .unwrap_or(("", ""));
        if let Some(over) = self.name_overrides.get(uuid) {
            return Some(format!("{prefix}{}{suffix}", over.name));
        }
        if let Some(display) = &tab.display_name {
            return Some(chat::flatten_str(display));
        }
        Some(format!("{prefix}{}{suffix}", tab.name))
    }

    // --- Extension-owned overrides ---

    pub fn set_name_override(&mut self, uuid: Uuid, owner: u32, name: impl Into<String>) {
        self.name_overrides.insert(
            uuid,
            NameOverride {
                owner,
                name: name.into(),
            },
        );
    }

    pub fn clear_name_override(&mut self, uuid: &Uuid, owner: u32) {
        if self.name_overrides.get(uuid).is_some_and(|o| o.owner == owner) {
            self.name_overrides.remove(uuid);
        }
    }

    /// Remove every override installed by `owner`.
    /// Drop every override `owner` holds and return the players it covered.
    pub fn clear_name_overrides_of(&mut self, owner: u32) -> Vec<Uuid> {
        let mut cleared: Vec<Uuid> = self
            .name_overrides
            .iter()
            .filter(|(_, o)| o.owner == owner)
            .map(|(uuid, _)| *uuid)
            .collect();
        cleared.sort_by_key(|uuid| uuid.0);
        for uuid in &cleared {
            self.name_overrides.remove(uuid);
        }
        cleared
    }

    pub fn name_override(&self, uuid: &Uuid) -> Option<&str> {
        self.name_overrides.get(uuid).map(|o| o.name.as_str())
    }
}
