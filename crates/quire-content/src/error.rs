use quire_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("An unknown error occurred while loading content collections: {0}")]
    UnknownCollectionError(String),

    #[error("invalid content config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failure from a user-supplied config source; not yet classified.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContentError {
    /// Keep domain errors as they are; wrap anything else.
    pub fn into_domain(self) -> Self {
        match self {
            Self::Other(e) => Self::UnknownCollectionError(format!("{e:#}")),
            other => other,
        }
    }
}

pub type ContentResult<T> = Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_errors_are_wrapped() {
        let err = ContentError::Other(anyhow::anyhow!("disk on fire")).into_domain();
        assert!(matches!(err, ContentError::UnknownCollectionError(_)));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn domain_errors_are_kept() {
        let err = ContentError::InvalidConfig("no loader".into()).into_domain();
        assert!(matches!(err, ContentError::InvalidConfig(_)));
    }
}
