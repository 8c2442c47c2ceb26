use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown collection type: {0}")]
    UnknownCollectionType(String),

    #[error("invalid file extension `{0}`: must start with '.'")]
    InvalidExtension(String),
}
