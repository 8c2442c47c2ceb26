use std::path::PathBuf;

use quire_loader::LoaderError;
use quire_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(
        "The following collections have a loader defined, but the content layer is not enabled: {}.",
        .collections.join(", ")
    )]
    ContentLayerDisabled { collections: Vec<String> },

    #[error("Collection loader for {collection} does not have a load method")]
    MissingLoad { collection: String },

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode collection manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("loader task failed: {0}")]
    Task(String),

    #[error("sync queue has shut down")]
    QueueClosed,
}

impl SyncError {
    /// Remediation shown to users for configuration errors.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ContentLayerDisabled { .. } => Some(
                "To enable the content layer, set `content_layer = true` under `[experimental]` in quire.toml.",
            ),
            Self::MissingLoad { .. } => {
                Some("Give the object loader a load step with `ObjectLoader::with_load`.")
            }
            _ => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
