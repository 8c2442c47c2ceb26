use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use quire_types::DataEntry;

use crate::error::StoreResult;

/// Entries of a single collection.
///
/// All implementations must satisfy these invariants:
/// - Ids are unique; `set` with an existing id replaces the entry.
/// - `set` is a no-op returning `false` when the stored entry carries the
///   same non-empty digest as the new one.
/// - Handles for the same collection observe each other's writes.
pub trait ScopedStore: Send + Sync {
    fn get(&self, id: &str) -> Option<DataEntry>;

    /// Insert or replace an entry. Returns `true` if the store changed.
    fn set(&self, entry: DataEntry) -> bool;

    fn delete(&self, id: &str);

    /// Remove every entry of this collection.
    fn clear(&self);

    fn has(&self, id: &str) -> bool;

    fn keys(&self) -> Vec<String>;

    fn values(&self) -> Vec<DataEntry>;

    fn entries(&self) -> Vec<(String, DataEntry)>;

    /// Record asset references found in an entry read from `file_path`.
    fn add_asset_imports(&self, assets: &[String], file_path: &str);

    /// Record an entry module that must be importable at build time.
    fn add_module_import(&self, file_name: &str);
}

/// Opaque string metadata, scoped to a collection or global.
pub trait MetaStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn has(&self, key: &str) -> bool;

    fn delete(&self, key: &str);
}

/// The whole data store.
///
/// The sync orchestrator is the only writer of a store; handles given to
/// loaders are scoped to one collection.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Handle for the entries of `collection`.
    fn scoped_store(&self, collection: &str) -> Arc<dyn ScopedStore>;

    /// Metadata handle for `collection`, or the global namespace for `None`.
    fn meta_store(&self, collection: Option<&str>) -> Arc<dyn MetaStore>;

    /// Remove all entries, metadata, and recorded imports.
    fn clear_all(&self);

    /// Entries of `collection`, empty if the collection is unknown.
    fn values(&self, collection: &str) -> Vec<DataEntry>;

    /// Serialize the whole store to a single cache file.
    async fn write_to_disk(&self, path: &Path) -> StoreResult<()>;

    /// Write the generated asset-imports module.
    async fn write_asset_imports(&self, path: &Path) -> StoreResult<()>;

    /// Write the generated module-imports module.
    async fn write_module_imports(&self, path: &Path) -> StoreResult<()>;
}
