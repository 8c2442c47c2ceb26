use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quire_types::{CollectionType, EntryType};
use serde::{Deserialize, Serialize};

use crate::collections::CollectionDecl;
use crate::error::{ConfigError, ConfigResult};

/// Default config file name.
pub const CONFIG_FILE: &str = "quire.toml";

/// Environment variable consulted when `dev` is not set explicitly.
/// Dev mode is on when it equals `development`.
pub const DEV_ENV_VAR: &str = "QUIRE_ENV";

/// Opt-in switches for features that are not stable yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentalFlags {
    /// Enables loader-backed (`content_layer`) collections.
    pub content_layer: bool,
    /// Maintains the editor-facing collection manifest after each sync.
    pub content_intellisense: bool,
}

/// Static project configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Path of the file this config was read from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    pub root: PathBuf,
    pub src_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Directory for generated files (`.quire`).
    pub generated_dir: PathBuf,
    /// Dev mode; `None` defers to [`DEV_ENV_VAR`].
    pub dev: Option<bool>,
    pub experimental: ExperimentalFlags,
    pub content_entry_types: Vec<EntryType>,
    pub data_entry_types: Vec<EntryType>,
    pub collections: BTreeMap<String, CollectionDecl>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            root: PathBuf::from("."),
            src_dir: PathBuf::from("src"),
            cache_dir: PathBuf::from(".cache/quire"),
            generated_dir: PathBuf::from(".quire"),
            dev: None,
            experimental: ExperimentalFlags::default(),
            content_entry_types: vec![EntryType::markdown()],
            data_entry_types: vec![EntryType::json(), EntryType::yaml(), EntryType::toml()],
            collections: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Read and validate a config file.
    ///
    /// A relative `root` is resolved against the directory holding the file.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config = Self::from_toml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if config.root.is_relative() {
            config.root = base.join(&config.root);
        }
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Parse config text without touching the file system.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        for entry_type in self.content_entry_types.iter().chain(&self.data_entry_types) {
            if let Some(ext) = entry_type.extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(ConfigError::Validation(format!(
                    "entry type `{}` has extension `{ext}` without a leading '.'",
                    entry_type.name
                )));
            }
        }
        for (name, collection) in &self.collections {
            match (collection.kind, &collection.loader) {
                (CollectionType::ContentLayer, None) => {
                    return Err(ConfigError::Validation(format!(
                        "collection `{name}` is a content_layer collection but declares no loader"
                    )));
                }
                (CollectionType::Content | CollectionType::Data, Some(_)) => {
                    return Err(ConfigError::Validation(format!(
                        "collection `{name}` declares a loader but its type is `{}`; use `content_layer`",
                        collection.kind
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve a path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.resolve(&self.cache_dir)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.resolve(&self.generated_dir)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.resolve(&self.src_dir)
    }

    /// Whether the project runs in dev mode.
    ///
    /// An explicit `dev` setting wins; otherwise [`DEV_ENV_VAR`] decides.
    pub fn is_dev(&self) -> bool {
        self.is_dev_with(std::env::var(DEV_ENV_VAR).ok().as_deref())
    }

    /// [`is_dev`](Self::is_dev) with the environment value supplied by the caller.
    pub fn is_dev_with(&self, env: Option<&str>) -> bool {
        self.dev.unwrap_or_else(|| env == Some("development"))
    }

    /// Whether `other` has the same settings, ignoring declared collections
    /// and the file it was read from.
    pub fn same_settings(&self, other: &Self) -> bool {
        self.root == other.root
            && self.src_dir == other.src_dir
            && self.cache_dir == other.cache_dir
            && self.generated_dir == other.generated_dir
            && self.dev == other.dev
            && self.experimental == other.experimental
            && self.content_entry_types == other.content_entry_types
            && self.data_entry_types == other.data_entry_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{FieldDecl, FieldTypeName, LoaderDecl};

    const SAMPLE: &str = r#"
cache_dir = "cache"

[experimental]
content_layer = true

[collections.posts]
type = "content_layer"
loader = { file = "data/posts.json" }

[collections.posts.schema]
title = "string"
tags = { type = "array", items = "string", required = false }
"#;

    #[test]
    fn defaults() {
        let c = ProjectConfig::default();
        assert_eq!(c.root, PathBuf::from("."));
        assert_eq!(c.generated_dir, PathBuf::from(".quire"));
        assert!(!c.experimental.content_layer);
        assert!(!c.experimental.content_intellisense);
        assert_eq!(c.content_entry_types[0].name, "markdown");
        assert_eq!(c.data_entry_types.len(), 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_collections_and_schema() {
        let c = ProjectConfig::from_toml(SAMPLE).unwrap();
        assert!(c.experimental.content_layer);
        assert_eq!(c.cache_dir, PathBuf::from("cache"));
        // Unset keys keep their defaults.
        assert_eq!(c.src_dir, PathBuf::from("src"));

        let posts = &c.collections["posts"];
        assert_eq!(posts.kind, CollectionType::ContentLayer);
        assert_eq!(posts.loader, Some(LoaderDecl::File("data/posts.json".into())));
        let schema = posts.schema.as_ref().unwrap();
        assert_eq!(schema["title"], FieldDecl::Short(FieldTypeName::String));
        match &schema["tags"] {
            FieldDecl::Full { kind, required, items, .. } => {
                assert_eq!(*kind, FieldTypeName::Array);
                assert!(!required);
                assert_eq!(*items, Some(FieldTypeName::String));
            }
            other => panic!("unexpected decl: {other:?}"),
        }
        assert!(c.validate().is_ok());
    }

    #[test]
    fn content_layer_without_loader_is_invalid() {
        let c = ProjectConfig::from_toml("[collections.posts]\ntype = \"content_layer\"\n").unwrap();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("declares no loader"));
    }

    #[test]
    fn loader_on_data_collection_is_invalid() {
        let c = ProjectConfig::from_toml(
            "[collections.authors]\ntype = \"data\"\nloader = { file = \"a.json\" }\n",
        )
        .unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_extension_is_invalid() {
        let mut c = ProjectConfig::default();
        c.data_entry_types.push(EntryType {
            name: "csv".into(),
            extensions: vec!["csv".into()],
        });
        assert!(c.validate().is_err());
    }

    #[test]
    fn from_path_resolves_root_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, SAMPLE).unwrap();

        let c = ProjectConfig::from_path(&path).unwrap();
        assert_eq!(c.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(c.root, dir.path().join("."));
        assert_eq!(c.cache_dir(), dir.path().join(".").join("cache"));
    }

    #[test]
    fn from_path_missing_file() {
        let err = ProjectConfig::from_path(Path::new("/definitely/not/here/quire.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn dev_mode_precedence() {
        let mut c = ProjectConfig::default();
        assert!(!c.is_dev_with(None));
        assert!(c.is_dev_with(Some("development")));
        assert!(!c.is_dev_with(Some("production")));

        c.dev = Some(false);
        assert!(!c.is_dev_with(Some("development")));
        c.dev = Some(true);
        assert!(c.is_dev_with(None));
    }

    #[test]
    fn same_settings_ignores_collections() {
        let base = ProjectConfig::from_toml(SAMPLE).unwrap();
        let mut other = base.clone();
        other.collections.clear();
        other.config_path = Some(PathBuf::from("elsewhere/quire.toml"));
        assert!(base.same_settings(&other));

        other.experimental.content_layer = false;
        assert!(!base.same_settings(&other));

        let mut moved = base.clone();
        moved.cache_dir = PathBuf::from("other-cache");
        assert!(!base.same_settings(&moved));
    }
}
