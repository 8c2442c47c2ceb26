use std::fmt;

use thiserror::Error;

/// A single schema violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending value, empty for the root.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "**{}**: {}", self.path, self.message)
        }
    }
}

/// Every violation found while parsing one value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationIssues(pub Vec<ValidationIssue>);

impl ValidationIssues {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, message));
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationIssues {}

/// Errors produced while resolving or applying a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("data does not match schema:\n{0}")]
    Invalid(ValidationIssues),

    #[error("schema factory failed: {0}")]
    Factory(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
