//! Collection-scoped data store for quire.
//!
//! The store holds every collection's entries plus a metadata namespace and
//! persists both to a single cache file. Loaders only ever see a handle scoped
//! to their own collection.
//!
//! # Handles
//!
//! - [`ScopedStore`] -- entries of one collection, keyed by entry id
//! - [`MetaStore`] -- opaque string key/value pairs, per collection or global
//! - [`DataStore`] -- the whole store: hands out scoped handles, clears, persists
//!
//! # Storage Backends
//!
//! - [`InMemoryDataStore`] -- `BTreeMap`-based store with JSON persistence
//!
//! # Design Rules
//!
//! 1. Entry ids are unique within a collection; `set` replaces by id.
//! 2. `clear_all` removes entries, metadata, and recorded imports.
//! 3. The store never interprets entry data.
//! 4. Generated files are deterministic for identical store contents.

pub mod error;
pub mod imports;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDataStore;
pub use traits::{DataStore, MetaStore, ScopedStore};
