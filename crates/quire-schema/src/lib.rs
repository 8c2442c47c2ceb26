//! Entry schema validation for quire.
//!
//! A collection may declare a [`Schema`] that validates and transforms the
//! raw data a loader produces before it is stored. Schemas are either given
//! directly or produced by an asynchronous [`SchemaFactory`]; see
//! [`SchemaSource`].
//!
//! [`ObjectSchema`] is the built-in declarative implementation: typed fields,
//! required/optional, defaults, and `image()` fields that record asset
//! references.

pub mod error;
pub mod object;
pub mod schema;

pub use error::{SchemaError, SchemaResult, ValidationIssue, ValidationIssues};
pub use object::{Field, FieldKind, ObjectSchema};
pub use schema::{Schema, SchemaFactory, SchemaSource};
