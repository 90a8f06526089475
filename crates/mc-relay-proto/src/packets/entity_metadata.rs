//! `entity_metadata`: Server → Client.
//!
//! Partial metadata updates: only changed keys are sent, so consumers must
//! merge them into what they already hold.

use serde::{Deserialize, Serialize};

/// Well-known metadata keys.
pub mod key {
    /// Byte bitmask of entity flags.
    pub const FLAGS: u8 = 0;
    /// Float health of living entities.
    pub const HEALTH: u8 = 6;
}

/// Bits of the [`key::FLAGS`] byte.
pub mod flag {
    pub const ON_FIRE: u8 = 0x01;
    pub const CROUCHING: u8 = 0x02;
    pub const SPRINTING: u8 = 0x08;
    pub const USING_ITEM: u8 = 0x10;
}

/// One metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: u8,
    #[serde(rename = "type")]
    pub kind: i32,
    pub value: serde_json::Value,
}

impl MetadataEntry {
    pub fn new(key: u8, kind: i32, value: serde_json::Value) -> Self {
        Self { key, kind, value }
    }
}

/// Look up an entry by key.
pub fn find(entries: &[MetadataEntry], key: u8) -> Option<&MetadataEntry> {
    entries.iter().find(|e| e.key == key)
}

/// Merge `delta` into `base`: replace entries with a matching key, append the rest.
pub fn merge(base: &mut Vec<MetadataEntry>, delta: &[MetadataEntry]) {
    for entry in delta {
        match base.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry.clone(),
            None => base.push(entry.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub entity_id: i32,
    pub metadata: Vec<MetadataEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_and_appends() {
        let mut base = vec![
            MetadataEntry::new(0, 0, json!(0)),
            MetadataEntry::new(6, 3, json!(20.0)),
        ];
        merge(
            &mut base,
            &[
                MetadataEntry::new(0, 0, json!(2)),
                MetadataEntry::new(7, 2, json!(0)),
            ],
        );
        assert_eq!(base.len(), 3);
        assert_eq!(find(&base, 0).unwrap().value, json!(2));
        assert_eq!(find(&base, 6).unwrap().value, json!(20.0));
        assert!(find(&base, 7).is_some());
    }

    #[test]
    fn decodes_type_field() {
        let entry: MetadataEntry =
            serde_json::from_value(json!({"key": 6, "type": 3, "value": 18.5})).unwrap();
        assert_eq!(entry.kind, 3);
        assert_eq!(entry.value.as_f64(), Some(18.5));
    }
}
