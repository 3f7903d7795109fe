//! Backend-agnostic record format exchanged with storage backends

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identifier of a storage container: a document root or a bundle
///
/// Serializes as a plain string. Backends choose the format; the built-in
/// stores use UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Create a new random ContainerId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a stored node or edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flattened attributes: `prefix:local` key → stored value
pub type StoredAttributes = BTreeMap<String, String>;

/// Records that exist only in storage and are never part of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// `prov:Unknown` node standing in for a missing relation endpoint
    Placeholder,
    /// Node representing a bundle as an entity of its document
    BundleEntity,
    /// `belongsToBundle` edge from a bundle element to its bundle
    BundleMembership,
}

/// Everything needed to rebuild a record from its stored attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// PROV type in `prefix:local` form
    #[serde(rename = "type")]
    pub prov_type: String,
    /// Identifier in `prefix:local` form; equals `prov_type` for anonymous records
    pub identifier: String,
    /// Every namespace the record uses: prefix → URI
    pub namespaces: BTreeMap<String, String>,
    /// Attribute key → type tag, for attributes that are not plain strings
    #[serde(default)]
    pub type_map: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<SyntheticKind>,
}

/// A stored node or edge as returned by [`ProvStore::get_document`](super::ProvStore::get_document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub metadata: Metadata,
    pub attributes: StoredAttributes,
}

/// A stored bundle: its entity node and the records it contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBundle {
    pub bundle_record: RawRecord,
    pub records: Vec<RawRecord>,
}

/// A stored document: top-level records and bundles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub records: Vec<RawRecord>,
    pub bundles: Vec<RawBundle>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_json_shape() {
        let metadata = Metadata {
            prov_type: "prov:Entity".into(),
            identifier: "ex:e1".into(),
            namespaces: BTreeMap::from([("ex".to_string(), "http://example.org/".to_string())]),
            type_map: BTreeMap::new(),
            synthetic: None,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "prov:Entity",
                "identifier": "ex:e1",
                "namespaces": {"ex": "http://example.org/"},
                "type_map": {}
            })
        );
    }

    #[test]
    fn test_metadata_synthetic_marker_round_trips() {
        let value = json!({
            "type": "prov:Unknown",
            "identifier": "prov:Unknown-1",
            "namespaces": {},
            "synthetic": "placeholder"
        });
        let metadata: Metadata = serde_json::from_value(value).unwrap();
        assert_eq!(metadata.synthetic, Some(SyntheticKind::Placeholder));
        assert!(metadata.type_map.is_empty());
    }
}
