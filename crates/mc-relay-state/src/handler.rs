//! Routing from a state-mutating packet to the handler that owns it.

use mc_relay_proto::{Packet, ProtoError};

use crate::store::ShadowState;
use crate::{entity, inventory, movement, player, team};

/// The per-concern state mutation handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateHandler {
    /// Login, respawn, health, held slot, tab list.
    Player,
    /// Spawn, destroy, metadata, equipment, effects, status.
    Entity,
    /// Teleports, relative moves, look updates, local position.
    Movement,
    /// Windows, slots and click resolution.
    Inventory,
    /// Teams, objectives and scores.
    Team,
}

impl StateHandler {
    /// Apply `packet` to `state`.
    ///
    /// An error means the fields could not be parsed; the state is left as
    /// it was.
    pub fn apply(self, state: &mut ShadowState, packet: &Packet) -> Result<(), ProtoError> {
        match self {
            StateHandler::Player => player::apply(state, packet),
            StateHandler::Entity => entity::apply(state, packet),
            StateHandler::Movement => movement::apply(state, packet),
            StateHandler::Inventory => inventory::apply(state, packet),
            StateHandler::Team => team::apply(state, packet),
        }
    }
}
