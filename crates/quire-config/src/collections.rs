//! Collections declared in `quire.toml`.
//!
//! ```toml
//! [collections.posts]
//! type = "content_layer"
//! loader = { file = "data/posts.json" }
//!
//! [collections.posts.schema]
//! title = "string"
//! tags = { type = "array", items = "string", required = false }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use quire_types::CollectionType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionDecl {
    #[serde(rename = "type", default)]
    pub kind: CollectionType,
    #[serde(default)]
    pub loader: Option<LoaderDecl>,
    #[serde(default)]
    pub schema: Option<BTreeMap<String, FieldDecl>>,
}

/// Built-in loaders that can be declared without code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderDecl {
    /// Entries read from one JSON or TOML file, relative to the project root.
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTypeName {
    String,
    Number,
    Boolean,
    Array,
    Any,
    Image,
}

/// A schema field: either just a type name or a table with options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDecl {
    Short(FieldTypeName),
    Full {
        #[serde(rename = "type")]
        kind: FieldTypeName,
        #[serde(default = "default_required")]
        required: bool,
        #[serde(default)]
        default: Option<Value>,
        #[serde(default)]
        items: Option<FieldTypeName>,
    },
}

fn default_required() -> bool {
    true
}

impl FieldDecl {
    pub fn kind(&self) -> FieldTypeName {
        match self {
            Self::Short(kind) | Self::Full { kind, .. } => *kind,
        }
    }
}
