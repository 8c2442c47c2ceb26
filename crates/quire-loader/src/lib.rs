//! Loader contract for quire collections.
//!
//! A `content_layer` collection is filled by a loader. Loaders come in two
//! shapes (see [`CollectionLoader`]):
//!
//! - a **function loader** that returns every entry; it is run through the
//!   [`simple_loader`] adapter, which replaces the collection wholesale
//! - an **object loader** with a name and a `load` method that receives a
//!   [`LoaderContext`] and manages the collection's store itself
//!
//! [`FileLoader`] is the built-in object loader for entries kept in a single
//! JSON or TOML file.

pub mod context;
pub mod error;
pub mod file;
pub mod loader;
pub mod logger;
pub mod simple;
pub mod watcher;

pub use context::{LoaderContext, LoaderContextBuilder, ParseData, ParseDataOptions};
pub use error::{LoaderError, LoaderResult};
pub use file::FileLoader;
pub use loader::{CollectionLoader, EntrySource, FunctionLoader, ObjectLoad, ObjectLoader};
pub use logger::IntegrationLogger;
pub use simple::simple_loader;
pub use watcher::{FileWatcher, WatchEvent, WatchEventKind};
