use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of a declared collection.
///
/// Only `content_layer` collections carry a loader and take part in a sync;
/// `content` and `data` collections are file-system collections handled
/// elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    #[default]
    Content,
    Data,
    ContentLayer,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Data => "data",
            Self::ContentLayer => "content_layer",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(Self::Content),
            "data" => Ok(Self::Data),
            "content_layer" => Ok(Self::ContentLayer),
            other => Err(TypeError::UnknownCollectionType(other.to_string())),
        }
    }
}

/// Descriptor for a family of entry files sharing a parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryType {
    pub name: String,
    /// Extensions including the leading dot, e.g. `.md`.
    pub extensions: Vec<String>,
}

impl EntryType {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Result<Self, TypeError> {
        let extensions = extensions
            .iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    Ok(ext.to_string())
                } else {
                    Err(TypeError::InvalidExtension(ext.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            extensions,
        })
    }

    /// Markdown content entries.
    pub fn markdown() -> Self {
        Self {
            name: "markdown".into(),
            extensions: [".md", ".markdown", ".mdown", ".mkdn", ".mkd", ".mdwn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// JSON data entries.
    pub fn json() -> Self {
        Self {
            name: "json".into(),
            extensions: vec![".json".into()],
        }
    }

    /// YAML data entries.
    pub fn yaml() -> Self {
        Self {
            name: "yaml".into(),
            extensions: vec![".yaml".into(), ".yml".into()],
        }
    }

    /// TOML data entries.
    pub fn toml() -> Self {
        Self {
            name: "toml".into(),
            extensions: vec![".toml".into()],
        }
    }
}

/// Index entry types by extension.
///
/// When two entry types claim the same extension the later one wins.
pub fn entry_types_by_extension<'a, I>(entry_types: I) -> BTreeMap<String, EntryType>
where
    I: IntoIterator<Item = &'a EntryType>,
{
    let mut map = BTreeMap::new();
    for entry_type in entry_types {
        for ext in &entry_type.extensions {
            map.insert(ext.clone(), entry_type.clone());
        }
    }
    map
}
