//! Handshake and login-phase packets.
//!
//! The relay captures the client's handshake and login start, replays them
//! upstream, and watches for the upstream's login outcome.

use serde::{Deserialize, Serialize};

/// `set_protocol`: Client → Server (Handshaking).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProtocol {
    pub protocol_version: i32,
    pub server_host: String,
    pub server_port: u16,
    /// 1 = status, 2 = login.
    pub next_state: i32,
}

impl SetProtocol {
    pub const NEXT_STATUS: i32 = 1;
    pub const NEXT_LOGIN: i32 = 2;

    /// Copy of this handshake aimed at a different server.
    pub fn retargeted(&self, host: &str, port: u16) -> Self {
        Self {
            server_host: host.to_string(),
            server_port: port,
            ..self.clone()
        }
    }
}

/// `login_start`: Client → Server (Login).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginStart {
    pub username: String,
}

/// `success`: Server → Client (Login).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub uuid: String,
    pub username: String,
}

/// `disconnect`: Server → Client (Login). `reason` is a JSON chat component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginDisconnect {
    pub reason: String,
}
