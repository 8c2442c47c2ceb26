use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quire_types::DataEntry;
use serde_json::Value;

use crate::context::{LoaderContext, ParseDataOptions};
use crate::error::{LoaderError, LoaderResult};
use crate::loader::{CollectionLoader, ObjectLoad, ObjectLoader};

/// Loads a collection from one JSON or TOML file.
///
/// The file holds either an array of records with a string `id`, or an
/// object keyed by id. TOML files are always the keyed form.
#[derive(Clone, Debug)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub const NAME: &'static str = "file";

    /// `path` is resolved against the project root at load time.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_loader(self) -> CollectionLoader {
        CollectionLoader::Object(self.into())
    }

    async fn read(&self, path: &Path, collection: &str) -> LoaderResult<Vec<(String, Value)>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let parse_err = |reason: String| LoaderError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        let document: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                let table: toml::Table = toml::from_str(&text).map_err(|e| parse_err(e.to_string()))?;
                serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))?
            }
            _ => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
        };

        match document {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item.get("id").and_then(Value::as_str) {
                    Some(id) => Ok((id.to_string(), item)),
                    None => Err(LoaderError::MissingId {
                        collection: collection.to_string(),
                        index,
                    }),
                })
                .collect(),
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(parse_err(format!(
                "expected an array or object of entries, found {}",
                kind_of(&other)
            ))),
        }
    }
}

#[async_trait]
impl ObjectLoad for FileLoader {
    async fn load(&self, context: LoaderContext) -> LoaderResult<()> {
        let absolute = context.config.resolve(&self.path);
        let file_path = self.path.to_string_lossy().replace('\\', "/");

        let records = self.read(&absolute, &context.collection).await?;

        context.store.clear();
        let count = records.len();
        for (id, raw) in records {
            let digest = context.generate_digest.generate(&raw);
            let data = context
                .parse_data
                .parse(ParseDataOptions::new(id.clone(), raw).with_file_path(file_path.clone()))
                .await?;
            context.store.set(
                DataEntry::new(id, data)
                    .with_file_path(file_path.clone())
                    .with_digest(digest),
            );
        }
        context
            .logger
            .debug(format!("loaded {count} entries from {file_path}"));

        if let Some(watcher) = &context.watcher {
            watcher.watch(&absolute);
        }
        Ok(())
    }
}

impl From<FileLoader> for ObjectLoader {
    fn from(loader: FileLoader) -> Self {
        ObjectLoader::new(FileLoader::NAME).with_load(loader)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LoaderContextBuilder, ParseData};
    use crate::watcher::FileWatcher;
    use quire_config::ProjectConfig;
    use quire_schema::{Field, ObjectSchema};
    use quire_store::InMemoryDataStore;
    use serde_json::json;
    use std::sync::Arc;

    fn context(root: &Path, store: &InMemoryDataStore, parse_data: ParseData) -> LoaderContext {
        let config = ProjectConfig {
            root: root.to_path_buf(),
            ..ProjectConfig::default()
        };
        LoaderContextBuilder::new(Arc::new(store.clone()), Arc::new(config))
            .watcher(Some(FileWatcher::new()))
            .build("posts", FileLoader::NAME, parse_data, None)
    }

    #[tokio::test]
    async fn loads_json_array() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/posts.json"),
            r#"[{"id": "p1", "title": "Hello"}, {"id": "p2", "title": "World"}]"#,
        )
        .unwrap();

        let store = InMemoryDataStore::new();
        let schema = ObjectSchema::new().field("title", Field::string());
        let ctx = context(dir.path(), &store, ParseData::new("posts", Some(Arc::new(schema))));
        FileLoader::new("data/posts.json").load(ctx.clone()).await.unwrap();

        let entry = ctx.store.get("p1").unwrap();
        assert_eq!(entry.data, json!({"title": "Hello"}));
        assert_eq!(entry.file_path.as_deref(), Some("data/posts.json"));
        assert_eq!(entry.digest.as_ref().map(String::len), Some(16));
        assert_eq!(ctx.store.keys().len(), 2);
        assert!(ctx
            .watcher
            .as_ref()
            .unwrap()
            .is_watched(dir.path().join("data/posts.json")));
    }

    #[tokio::test]
    async fn loads_keyed_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("authors.toml"),
            "[ada]\nname = \"Ada\"\n\n[grace]\nname = \"Grace\"\n",
        )
        .unwrap();

        let store = InMemoryDataStore::new();
        let ctx = context(dir.path(), &store, ParseData::new("posts", None));
        FileLoader::new("authors.toml").load(ctx.clone()).await.unwrap();

        assert_eq!(ctx.store.get("ada").unwrap().data, json!({"name": "Ada"}));
        assert!(ctx.store.has("grace"));
    }

    #[tokio::test]
    async fn reload_drops_removed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("posts.json");
        std::fs::write(&file, r#"{"a": {"n": 1}, "b": {"n": 2}}"#).unwrap();

        let store = InMemoryDataStore::new();
        let ctx = context(dir.path(), &store, ParseData::new("posts", None));
        let loader = FileLoader::new("posts.json");
        loader.load(ctx.clone()).await.unwrap();
        assert_eq!(ctx.store.keys().len(), 2);

        std::fs::write(&file, r#"{"b": {"n": 2}}"#).unwrap();
        loader.load(ctx.clone()).await.unwrap();
        assert_eq!(ctx.store.keys(), vec!["b"]);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryDataStore::new();
        let ctx = context(dir.path(), &store, ParseData::new("posts", None));
        let err = FileLoader::new("nope.json").load(ctx).await.unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[tokio::test]
    async fn array_record_without_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("posts.json"), r#"[{"title": "x"}]"#).unwrap();
        let store = InMemoryDataStore::new();
        let ctx = context(dir.path(), &store, ParseData::new("posts", None));
        let err = FileLoader::new("posts.json").load(ctx).await.unwrap_err();
        match err {
            LoaderError::MissingId { collection, index } => {
                assert_eq!(collection, "posts");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn scalar_document_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("posts.json"), "42").unwrap();
        let store = InMemoryDataStore::new();
        let ctx = context(dir.path(), &store, ParseData::new("posts", None));
        let err = FileLoader::new("posts.json").load(ctx).await.unwrap_err();
        assert!(err.to_string().contains("found a number"));
    }

    #[test]
    fn converts_to_named_object_loader() {
        let loader = FileLoader::new("data/posts.json").into_loader();
        assert_eq!(loader.name(), Some("file"));
    }
}
