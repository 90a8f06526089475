//! `window_click`: Client → Server.
//!
//! Carries only the click intent; the resulting slot contents are computed
//! locally by both the client and the server.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Slot index meaning "outside the window".
pub const OUTSIDE: i16 = -999;

/// Values of [`WindowClick::mode`].
pub mod mode {
    pub const CLICK: i8 = 0;
    pub const SHIFT_CLICK: i8 = 1;
    pub const NUMBER_KEY: i8 = 2;
    pub const MIDDLE_CLICK: i8 = 3;
    pub const DROP: i8 = 4;
    pub const DRAG: i8 = 5;
    pub const DOUBLE_CLICK: i8 = 6;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowClick {
    pub window_id: u8,
    pub slot: i16,
    pub mouse_button: i8,
    pub action: i16,
    pub mode: i8,
    #[serde(default)]
    pub item: Slot,
}

impl WindowClick {
    pub fn is_outside(&self) -> bool {
        self.slot == OUTSIDE
    }
}
