//! `kick_disconnect`: Server → Client (Play). `reason` is a JSON chat component.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickDisconnect {
    pub reason: String,
}

impl KickDisconnect {
    pub fn with_message(text: &str) -> Self {
        Self {
            reason: crate::chat::text_component(text),
        }
    }
}
