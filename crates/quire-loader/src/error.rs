use std::path::PathBuf;

use quire_schema::{SchemaError, ValidationIssues};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("**{collection} → {id}** data does not match collection schema.\n{issues}")]
    InvalidEntry {
        collection: String,
        id: String,
        file_path: Option<String>,
        issues: ValidationIssues,
    },

    #[error("entry {index} of collection `{collection}` has no string `id`")]
    MissingId { collection: String, index: usize },

    #[error("schema for collection `{collection}` could not be resolved: {source}")]
    Schema {
        collection: String,
        #[source]
        source: SchemaError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quire_schema::ValidationIssue;

    #[test]
    fn invalid_entry_names_collection_and_id() {
        let err = LoaderError::InvalidEntry {
            collection: "posts".into(),
            id: "p1".into(),
            file_path: None,
            issues: ValidationIssues(vec![ValidationIssue::new("title", "Required")]),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("**posts → p1**"));
        assert!(msg.contains("**title**: Required"));
    }
}
