//! Project settings for quire.
//!
//! [`ProjectConfig`] is the static configuration of a project, read from
//! `quire.toml`. It is handed unchanged to every loader and decides where the
//! content layer writes its cache and generated files.

pub mod collections;
pub mod error;
pub mod project;

pub use collections::{CollectionDecl, FieldDecl, FieldTypeName, LoaderDecl};
pub use error::{ConfigError, ConfigResult};
pub use project::{ExperimentalFlags, ProjectConfig, CONFIG_FILE, DEV_ENV_VAR};
