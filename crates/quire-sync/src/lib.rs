//! Content layer sync orchestrator for quire.
//!
//! [`ContentLayer`] runs every `content_layer` collection's loader and
//! persists the result. Syncs go through a single-writer queue: each call to
//! [`ContentLayer::sync`] enqueues one job, jobs run strictly one at a time in
//! call order, and a failed job never blocks the ones behind it.
//!
//! A sync fully clears the store first when the content config digest or
//! the running quire version differs from what the store last saw.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), quire_sync::SyncError> {
//! use std::sync::Arc;
//! use quire_config::ProjectConfig;
//! use quire_content::ContentObservable;
//! use quire_store::InMemoryDataStore;
//! use quire_sync::{ContentLayer, ContentLayerOptions, SyncOptions};
//!
//! let layer = ContentLayer::new(ContentLayerOptions {
//!     settings: Arc::new(ProjectConfig::default()),
//!     store: Arc::new(InMemoryDataStore::new()),
//!     observer: ContentObservable::default(),
//!     watcher: None,
//! });
//! layer.sync(SyncOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod host;
pub mod layer;
pub mod manifest;
pub mod options;
pub mod paths;

pub use error::{SyncError, SyncResult};
pub use host::ContentLayerHost;
pub use layer::{ContentLayer, ContentLayerOptions, SyncHandle};
pub use manifest::{ensure_collection_manifest, regenerate_collection_file_manifest, CollectionManifest};
pub use options::SyncOptions;
pub use paths::data_store_file;
