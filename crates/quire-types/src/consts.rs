//! Well-known file names and metadata keys of the content layer.
//!
//! Paths are relative: the data store file lives in either the cache
//! directory or the generated directory, the others always live in the
//! generated directory.

/// Version of the running engine. A persisted store written by a different
/// version is discarded on the next sync.
pub const QUIRE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialized data store, one file for every collection and all metadata.
pub const DATA_STORE_FILE: &str = "data-store.json";

/// Generated module enumerating asset imports referenced by entries.
pub const ASSET_IMPORTS_FILE: &str = "content-assets.mjs";

/// Generated module enumerating lazily imported entry modules.
pub const MODULES_IMPORTS_FILE: &str = "content-modules.mjs";

/// Editor-facing manifest mapping entry files to their collections.
pub const COLLECTIONS_MANIFEST_FILE: &str = "collections/collections.json";

/// Global metadata key holding the digest of the last synced content config.
pub const CONFIG_DIGEST_KEY: &str = "config-digest";

/// Global metadata key holding the engine version that wrote the store.
pub const VERSION_KEY: &str = "quire-version";

/// Prefix applied to image references produced by `image()` schema fields.
pub const IMAGE_IMPORT_PREFIX: &str = "__QUIRE_IMAGE_";
