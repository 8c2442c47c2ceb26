//! Editor-facing manifest mapping entry files to their collections.
//!
//! ```json
//! {
//!   "collections": [{ "name": "posts", "hasSchema": true }],
//!   "entries": { "file:///site/data/posts.json": "posts" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use quire_config::ProjectConfig;
use quire_content::ContentConfig;
use quire_store::DataStore;
use quire_types::COLLECTIONS_MANIFEST_FILE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::{SyncError, SyncResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionManifest {
    #[serde(default)]
    pub collections: Vec<ManifestCollection>,
    /// Lowercased `file://` URL of an entry file to its collection name.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestCollection {
    pub name: String,
    #[serde(rename = "hasSchema", default)]
    pub has_schema: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error)]
enum ManifestError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

fn manifest_path(settings: &ProjectConfig) -> PathBuf {
    settings.generated_dir().join(COLLECTIONS_MANIFEST_FILE)
}

/// Write the manifest's collection list from `config`, keeping any entries
/// already recorded.
pub async fn ensure_collection_manifest(
    settings: &ProjectConfig,
    config: &ContentConfig,
) -> SyncResult<()> {
    let path = manifest_path(settings);
    let mut manifest = match tokio::fs::read_to_string(&path).await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "Replacing unreadable collection manifest");
            CollectionManifest::default()
        }),
        Err(_) => CollectionManifest::default(),
    };
    manifest.collections = config
        .collections
        .iter()
        .map(|(name, collection)| ManifestCollection {
            name: name.clone(),
            has_schema: collection.schema.is_some()
                || collection.loader.as_ref().is_some_and(|l| l.schema().is_some()),
            extra: Map::new(),
        })
        .collect();

    let io = |source| SyncError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io)?;
    }
    let text = serde_json::to_string_pretty(&manifest)?;
    tokio::fs::write(&path, text).await.map_err(io)?;
    Ok(())
}

/// Record the file of every stored entry of each schema-bearing collection.
///
/// Best-effort: does nothing when the manifest does not exist, and failures
/// are logged rather than returned.
pub async fn regenerate_collection_file_manifest(settings: &ProjectConfig, store: &dyn DataStore) {
    let path = manifest_path(settings);
    debug!("Regenerating collection file manifest");
    if path.exists() {
        if let Err(e) = try_regenerate(&path, &settings.root, store).await {
            error!(error = %e, path = %path.display(), "Failed to regenerate collection file manifest");
        }
    }
    debug!("Regenerated collection file manifest");
}

async fn try_regenerate(path: &Path, root: &Path, store: &dyn DataStore) -> Result<(), ManifestError> {
    let text = tokio::fs::read_to_string(path).await?;
    let mut manifest: CollectionManifest = serde_json::from_str(&text)?;

    for collection in manifest.collections.iter().filter(|c| c.has_schema) {
        let entries = store.values(&collection.name);
        if entries.first().and_then(|e| e.file_path.as_ref()).is_none() {
            continue;
        }
        for file_path in entries.iter().filter_map(|e| e.file_path.as_deref()) {
            let key = file_url(&root.join(file_path)).to_lowercase();
            manifest.entries.insert(key, collection.name.clone());
        }
    }

    tokio::fs::write(path, serde_json::to_string_pretty(&manifest)?).await?;
    Ok(())
}

/// `file://` URL of `path`, made absolute and with `..` resolved.
fn file_url(path: &Path) -> String {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut prefix = String::new();
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => prefix = format!("/{}", p.as_os_str().to_string_lossy()),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                segments.pop();
            }
            Component::Normal(s) => segments.push(urlencoding::encode(&s.to_string_lossy()).into_owned()),
        }
    }
    format!("file://{prefix}/{}", segments.join("/"))
}
