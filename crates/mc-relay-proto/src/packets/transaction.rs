//! `transaction`: Bidirectional. Server accept/reject of a window click.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub window_id: i8,
    pub action: i16,
    pub accepted: bool,
}
