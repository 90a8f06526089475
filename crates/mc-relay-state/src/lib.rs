//! Shadow model of remote-authoritative game state.
//!
//! The relay cannot query the server, so everything here is rebuilt from
//! observed packets. [`ShadowState`] owns every record; the handler modules
//! are the only code that mutates it.

pub mod entity;
pub mod handler;
pub mod inventory;
pub mod movement;
pub mod player;
pub mod store;
pub mod team;

pub use entity::{Effect, Entity, EntityFlags, EntityKind};
pub use handler::StateHandler;
pub use inventory::{Inventory, SlotRef};
pub use player::{LocalPlayer, TabEntry};
pub use store::{PlayerRecord, ShadowState};
pub use team::{Objective, Team};
