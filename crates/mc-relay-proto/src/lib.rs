//! Java Edition packet model as seen by the relay.
//!
//! Raw byte (de)serialization belongs to a [`codec::PacketCodec`]; everything
//! in this crate works on named packets carrying decoded JSON fields.

pub mod chat;
pub mod codec;
pub mod error;
pub mod packet;
pub mod packets;
pub mod slot;
pub mod types;

pub use error::ProtoError;
pub use packet::{Direction, Packet, ProtocolState};
pub use slot::{ItemStack, Slot};
