//! Foundation types for quire.
//!
//! This crate provides the plain data shared by every other quire crate:
//! the stored entry record, the collection kinds a content config may
//! declare, the entry-type descriptors keyed by file extension, and the
//! well-known file names and metadata keys of the content layer.
//!
//! # Key Types
//!
//! - [`DataEntry`]: One stored record of a collection, with optional file provenance
//! - [`CollectionType`]: `content`, `data`, or `content_layer`
//! - [`EntryType`]: File-extension descriptor for content and data entries

pub mod collection;
pub mod consts;
pub mod entry;
pub mod error;

pub use collection::{entry_types_by_extension, CollectionType, EntryType};
pub use consts::{
    ASSET_IMPORTS_FILE, COLLECTIONS_MANIFEST_FILE, CONFIG_DIGEST_KEY, DATA_STORE_FILE,
    IMAGE_IMPORT_PREFIX, MODULES_IMPORTS_FILE, QUIRE_VERSION, VERSION_KEY,
};
pub use entry::DataEntry;
pub use error::TypeError;
