//! `chat`: Bidirectional.
//!
//! Towards the client `message` is a JSON chat component; towards the server
//! it is the raw text the player typed.

use serde::{Deserialize, Serialize};

/// Values of [`ChatMessage::position`].
pub mod position {
    pub const CHAT: i8 = 0;
    pub const SYSTEM: i8 = 1;
    pub const ACTION_BAR: i8 = 2;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i8>,
}

impl ChatMessage {
    /// A system message for the client carrying plain `text`.
    pub fn system(text: &str) -> Self {
        Self {
            message: crate::chat::text_component(text),
            position: Some(position::SYSTEM),
        }
    }
}
