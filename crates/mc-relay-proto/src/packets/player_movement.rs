//! Local player movement.
//!
//! `position` (Server → Client) places the player, with `flags` marking
//! which components are relative. The client reports its own movement with
//! `flying`, `position`, `look` and `position_look`.

use serde::{Deserialize, Serialize};

/// Bits of [`ServerPosition::flags`] marking relative components.
pub mod relative {
    pub const X: i8 = 0x01;
    pub const Y: i8 = 0x02;
    pub const Z: i8 = 0x04;
    pub const YAW: i8 = 0x08;
    pub const PITCH: i8 = 0x10;
}

/// `position`: Server → Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    #[serde(default)]
    pub flags: i8,
}

impl ServerPosition {
    pub fn is_relative(&self, bit: i8) -> bool {
        self.flags & bit != 0
    }
}

/// `flying`, `position`, `look`, `position_look`: Client → Server.
///
/// All four share one shape; absent components are simply missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMovement {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub yaw: Option<f32>,
    #[serde(default)]
    pub pitch: Option<f32>,
    pub on_ground: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relative_flags() {
        let pos: ServerPosition = serde_json::from_value(
            json!({"x": 1.0, "y": 2.0, "z": 3.0, "yaw": 0.0, "pitch": 0.0, "flags": 0x09}),
        )
        .unwrap();
        assert!(pos.is_relative(relative::X));
        assert!(pos.is_relative(relative::YAW));
        assert!(!pos.is_relative(relative::Y));
    }

    #[test]
    fn look_only_has_no_position() {
        let mv: ClientMovement =
            serde_json::from_value(json!({"yaw": 90.0, "pitch": 10.0, "onGround": true}))
                .unwrap();
        assert!(mv.x.is_none());
        assert_eq!(mv.yaw, Some(90.0));
        assert!(mv.on_ground);
    }
}
