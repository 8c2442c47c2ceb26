use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single record stored in a collection.
///
/// `id` is unique within its collection. `data` is the validated entry data;
/// the remaining fields are optional provenance and rendering hints set by
/// loaders that read entries from files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub id: String,
    pub data: Value,
    #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Content digest of the raw entry, used to skip unchanged writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, rename = "assetImports", skip_serializing_if = "Vec::is_empty")]
    pub asset_imports: Vec<String>,
    #[serde(default, rename = "deferredRender", skip_serializing_if = "std::ops::Not::not")]
    pub deferred_render: bool,
}

impl DataEntry {
    /// Create an entry with only an id and data.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
            file_path: None,
            body: None,
            digest: None,
            asset_imports: Vec::new(),
            deferred_render: false,
        }
    }

    /// Attach the file the entry was read from (relative to the project root).
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    /// Attach a content digest.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Attach the raw body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let entry = DataEntry::new("p1", json!({"title": "Hello"}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"id": "p1", "data": {"title": "Hello"}}));
    }

    #[test]
    fn provenance_uses_camel_case_keys() {
        let entry = DataEntry::new("p1", json!({}))
            .with_file_path("src/data/p1.json")
            .with_digest("00ff");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["filePath"], "src/data/p1.json");
        assert_eq!(value["digest"], "00ff");
    }

    #[test]
    fn deserialize_with_defaults() {
        let entry: DataEntry = serde_json::from_value(json!({"id": "x", "data": 1})).unwrap();
        assert_eq!(entry.id, "x");
        assert!(entry.file_path.is_none());
        assert!(entry.asset_imports.is_empty());
        assert!(!entry.deferred_render);
    }
}
