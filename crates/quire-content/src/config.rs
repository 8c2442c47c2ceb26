use std::collections::BTreeMap;

use quire_loader::CollectionLoader;
use quire_schema::SchemaSource;
use quire_types::CollectionType;

/// One declared collection.
#[derive(Clone, Debug)]
pub struct CollectionConfig {
    pub kind: CollectionType,
    pub schema: Option<SchemaSource>,
    /// Only meaningful for `content_layer` collections.
    pub loader: Option<CollectionLoader>,
}

impl CollectionConfig {
    pub fn content() -> Self {
        Self {
            kind: CollectionType::Content,
            schema: None,
            loader: None,
        }
    }

    pub fn data() -> Self {
        Self {
            kind: CollectionType::Data,
            ..Self::content()
        }
    }

    pub fn content_layer(loader: impl Into<CollectionLoader>) -> Self {
        Self {
            kind: CollectionType::ContentLayer,
            schema: None,
            loader: Some(loader.into()),
        }
    }

    pub fn with_schema(mut self, schema: SchemaSource) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn is_content_layer(&self) -> bool {
        self.kind == CollectionType::ContentLayer
    }
}

/// The parsed content configuration.
#[derive(Clone, Debug, Default)]
pub struct ContentConfig {
    pub collections: BTreeMap<String, CollectionConfig>,
    /// Digest of the config source text, set once loaded.
    pub digest: Option<String>,
}

impl ContentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, name: impl Into<String>, collection: CollectionConfig) -> Self {
        self.collections.insert(name.into(), collection);
        self
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Collections filled by a loader, in name order.
    pub fn content_layer_collections(&self) -> impl Iterator<Item = (&str, &CollectionConfig)> {
        self.collections
            .iter()
            .filter(|(_, c)| c.is_content_layer())
            .map(|(name, c)| (name.as_str(), c))
    }

    pub fn has_content_layer_collections(&self) -> bool {
        self.content_layer_collections().next().is_some()
    }
}
