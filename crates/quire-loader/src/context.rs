use std::collections::BTreeMap;
use std::sync::Arc;

use quire_config::ProjectConfig;
use quire_digest::DigestGenerator;
use quire_schema::Schema;
use quire_store::{DataStore, MetaStore, ScopedStore};
use quire_types::{entry_types_by_extension, EntryType};
use serde_json::Value;

use crate::error::{LoaderError, LoaderResult};
use crate::logger::IntegrationLogger;
use crate::watcher::FileWatcher;

/// Input to [`ParseData::parse`].
#[derive(Clone, Debug)]
pub struct ParseDataOptions {
    pub id: String,
    pub data: Value,
    pub file_path: Option<String>,
}

impl ParseDataOptions {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

/// Validates raw entry data against a collection's resolved schema.
#[derive(Clone)]
pub struct ParseData {
    collection: String,
    schema: Option<Arc<dyn Schema>>,
}

impl ParseData {
    pub fn new(collection: impl Into<String>, schema: Option<Arc<dyn Schema>>) -> Self {
        Self {
            collection: collection.into(),
            schema,
        }
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Return the validated data, or the data unchanged when the collection
    /// has no schema.
    pub async fn parse(&self, options: ParseDataOptions) -> LoaderResult<Value> {
        let Some(schema) = &self.schema else {
            return Ok(options.data);
        };
        schema
            .parse(&options.data)
            .map_err(|issues| LoaderError::InvalidEntry {
                collection: self.collection.clone(),
                id: options.id,
                file_path: options.file_path,
                issues,
            })
    }
}

impl std::fmt::Debug for ParseData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseData")
            .field("collection", &self.collection)
            .field("has_schema", &self.has_schema())
            .finish()
    }
}

/// Everything a loader gets for one collection during one sync.
#[derive(Clone)]
pub struct LoaderContext {
    pub collection: String,
    pub store: Arc<dyn ScopedStore>,
    pub meta: Arc<dyn MetaStore>,
    pub logger: IntegrationLogger,
    pub config: Arc<ProjectConfig>,
    pub parse_data: ParseData,
    pub generate_digest: DigestGenerator,
    pub watcher: Option<FileWatcher>,
    pub refresh_context_data: Option<Value>,
    /// File extension to entry type.
    pub entry_types: Arc<BTreeMap<String, EntryType>>,
}

impl LoaderContext {
    /// Entry type registered for `extension` (with leading dot).
    pub fn entry_type(&self, extension: &str) -> Option<&EntryType> {
        self.entry_types.get(extension)
    }
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("collection", &self.collection)
            .field("logger", &self.logger)
            .field("parse_data", &self.parse_data)
            .field("watcher", &self.watcher)
            .field("refresh_context_data", &self.refresh_context_data)
            .finish_non_exhaustive()
    }
}

/// Builds a [`LoaderContext`] per collection from the state shared by a sync.
#[derive(Clone)]
pub struct LoaderContextBuilder {
    store: Arc<dyn DataStore>,
    config: Arc<ProjectConfig>,
    logger: IntegrationLogger,
    watcher: Option<FileWatcher>,
    digest: DigestGenerator,
    entry_types: Arc<BTreeMap<String, EntryType>>,
}

impl LoaderContextBuilder {
    pub fn new(store: Arc<dyn DataStore>, config: Arc<ProjectConfig>) -> Self {
        let entry_types = entry_types_by_extension(
            config
                .content_entry_types
                .iter()
                .chain(config.data_entry_types.iter()),
        );
        Self {
            store,
            config,
            logger: IntegrationLogger::default(),
            watcher: None,
            digest: DigestGenerator::new(),
            entry_types: Arc::new(entry_types),
        }
    }

    pub fn logger(mut self, logger: IntegrationLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn watcher(mut self, watcher: Option<FileWatcher>) -> Self {
        self.watcher = watcher;
        self
    }

    pub fn digest(mut self, digest: DigestGenerator) -> Self {
        self.digest = digest;
        self
    }

    /// Context for `collection`; the logger is forked under `loader_name`.
    pub fn build(
        &self,
        collection: &str,
        loader_name: &str,
        parse_data: ParseData,
        refresh_context_data: Option<Value>,
    ) -> LoaderContext {
        LoaderContext {
            collection: collection.to_string(),
            store: self.store.scoped_store(collection),
            meta: self.store.meta_store(Some(collection)),
            logger: self.logger.fork(loader_name),
            config: Arc::clone(&self.config),
            parse_data,
            generate_digest: self.digest,
            watcher: self.watcher.clone(),
            refresh_context_data,
            entry_types: Arc::clone(&self.entry_types),
        }
    }
}
