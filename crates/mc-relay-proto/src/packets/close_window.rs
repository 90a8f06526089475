//! `close_window`: Bidirectional.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseWindow {
    pub window_id: u8,
}
