use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use quire_types::DataEntry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::imports::{render_asset_imports, render_module_imports, resolve_asset};
use crate::traits::{DataStore, MetaStore, ScopedStore};

/// Metadata scope used when no collection is given.
const GLOBAL_META_SCOPE: &str = ":global";

/// Everything the store holds. This is also the on-disk format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<String, DataEntry>>,
    #[serde(default)]
    meta: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, rename = "assetImports")]
    asset_imports: BTreeSet<String>,
    #[serde(default, rename = "moduleImports")]
    module_imports: BTreeSet<String>,
}

type SharedState = Arc<RwLock<StoreState>>;

/// In-memory data store with JSON persistence.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone, Default)]
pub struct InMemoryDataStore {
    state: SharedState,
}

impl InMemoryDataStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store previously written with [`DataStore::write_to_disk`].
    ///
    /// A missing or unreadable-as-JSON file yields an empty store. Without the
    /// version and digest markers the next sync rebuilds everything.
    pub async fn from_file(path: &Path) -> StoreResult<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no data store file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let state: StoreState = match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt data store file");
                return Ok(Self::new());
            }
        };
        debug!(
            path = %path.display(),
            collections = state.collections.len(),
            "loaded data store"
        );
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Names of all collections holding at least one entry.
    pub fn collection_names(&self) -> Vec<String> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .collections
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Total number of entries across all collections.
    pub fn len(&self) -> usize {
        let state = self.state.read().expect("store lock poisoned");
        state.collections.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no collection holds an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn serialize(&self) -> StoreResult<Vec<u8>> {
        let state = self.state.read().expect("store lock poisoned");
        serde_json::to_vec(&*state).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Writes a sibling temp file and renames it over `path`.
async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> StoreResult<()> {
    let temp_path = temp_path_for(path);
    tokio::fs::write(&temp_path, contents)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    fn scoped_store(&self, collection: &str) -> Arc<dyn ScopedStore> {
        Arc::new(ScopedHandle {
            collection: collection.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn meta_store(&self, collection: Option<&str>) -> Arc<dyn MetaStore> {
        Arc::new(MetaHandle {
            scope: collection.unwrap_or(GLOBAL_META_SCOPE).to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn clear_all(&self) {
        let mut state = self.state.write().expect("store lock poisoned");
        *state = StoreState::default();
    }

    fn values(&self, collection: &str) -> Vec<DataEntry> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .collections
            .get(collection)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn write_to_disk(&self, path: &Path) -> StoreResult<()> {
        let bytes = self.serialize()?;
        write_file(path, bytes).await?;
        debug!(path = %path.display(), "wrote data store");
        Ok(())
    }

    async fn write_asset_imports(&self, path: &Path) -> StoreResult<()> {
        let contents = {
            let state = self.state.read().expect("store lock poisoned");
            render_asset_imports(&state.asset_imports)
        };
        write_file(path, contents).await
    }

    async fn write_module_imports(&self, path: &Path) -> StoreResult<()> {
        let contents = {
            let state = self.state.read().expect("store lock poisoned");
            render_module_imports(&state.module_imports)
        };
        write_file(path, contents).await
    }
}

impl std::fmt::Debug for InMemoryDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDataStore")
            .field("entry_count", &self.len())
            .finish()
    }
}

/// Entries of one collection inside an [`InMemoryDataStore`].
struct ScopedHandle {
    collection: String,
    state: SharedState,
}

impl ScopedHandle {
    fn read<R>(&self, f: impl FnOnce(Option<&BTreeMap<String, DataEntry>>) -> R) -> R {
        let state = self.state.read().expect("store lock poisoned");
        f(state.collections.get(&self.collection))
    }
}

impl ScopedStore for ScopedHandle {
    fn get(&self, id: &str) -> Option<DataEntry> {
        self.read(|entries| entries.and_then(|e| e.get(id).cloned()))
    }

    fn set(&self, entry: DataEntry) -> bool {
        let mut state = self.state.write().expect("store lock poisoned");
        let unchanged = state
            .collections
            .get(&self.collection)
            .and_then(|entries| entries.get(&entry.id))
            .is_some_and(|existing| {
                existing.digest.is_some() && existing.digest == entry.digest
            });
        if unchanged {
            return false;
        }

        if !entry.asset_imports.is_empty() {
            let file_path = entry.file_path.clone().unwrap_or_default();
            for asset in &entry.asset_imports {
                if let Some(resolved) = resolve_asset(asset, &file_path) {
                    state.asset_imports.insert(resolved);
                }
            }
        }
        state
            .collections
            .entry(self.collection.clone())
            .or_default()
            .insert(entry.id.clone(), entry);
        true
    }

    fn delete(&self, id: &str) {
        let mut state = self.state.write().expect("store lock poisoned");
        if let Some(entries) = state.collections.get_mut(&self.collection) {
            entries.remove(id);
        }
    }

    fn clear(&self) {
        let mut state = self.state.write().expect("store lock poisoned");
        state.collections.remove(&self.collection);
    }

    fn has(&self, id: &str) -> bool {
        self.read(|entries| entries.is_some_and(|e| e.contains_key(id)))
    }

    fn keys(&self) -> Vec<String> {
        self.read(|entries| entries.map(|e| e.keys().cloned().collect()).unwrap_or_default())
    }

    fn values(&self) -> Vec<DataEntry> {
        self.read(|entries| entries.map(|e| e.values().cloned().collect()).unwrap_or_default())
    }

    fn entries(&self) -> Vec<(String, DataEntry)> {
        self.read(|entries| {
            entries
                .map(|e| e.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        })
    }

    fn add_asset_imports(&self, assets: &[String], file_path: &str) {
        let mut state = self.state.write().expect("store lock poisoned");
        for asset in assets {
            if let Some(resolved) = resolve_asset(asset, file_path) {
                state.asset_imports.insert(resolved);
            }
        }
    }

    fn add_module_import(&self, file_name: &str) {
        let mut state = self.state.write().expect("store lock poisoned");
        state.module_imports.insert(file_name.to_string());
    }
}

/// Metadata namespace inside an [`InMemoryDataStore`].
struct MetaHandle {
    scope: String,
    state: SharedState,
}

impl MetaStore for MetaHandle {
    fn get(&self, key: &str) -> Option<String> {
        let state = self.state.read().expect("store lock poisoned");
        state.meta.get(&self.scope).and_then(|m| m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        let mut state = self.state.write().expect("store lock poisoned");
        state
            .meta
            .entry(self.scope.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn delete(&self, key: &str) {
        let mut state = self.state.write().expect("store lock poisoned");
        if let Some(m) = state.meta.get_mut(&self.scope) {
            m.remove(key);
        }
    }
}
