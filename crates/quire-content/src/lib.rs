//! Content configuration for quire.
//!
//! [`ContentConfig`] is the parsed set of collections. It is never mutated in
//! place: each reload produces a new value that replaces the old one inside a
//! [`ContentObservable`], which broadcasts every state change to its
//! subscribers.
//!
//! # Lifecycle
//!
//! ```text
//! Init -> Loading -> { Loaded | DoesNotExist | Error }
//!            ^                     |
//!            +---------------------+   (on reload)
//! ```
//!
//! [`reload_content_config_observer`] drives one reload from a
//! [`ConfigSource`]. [`DeclaredConfigSource`] reads collections declared in
//! `quire.toml`.

pub mod config;
pub mod declared;
pub mod error;
pub mod observer;
pub mod reload;

pub use config::{CollectionConfig, ContentConfig};
pub use declared::{collections_from_declarations, DeclaredConfigSource};
pub use error::{ContentError, ContentResult};
pub use observer::{ContentConfigState, ContentObservable, Subscription};
pub use reload::{reload_content_config_observer, ConfigSource, LoadedConfig};
