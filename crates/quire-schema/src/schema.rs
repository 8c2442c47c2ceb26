use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{SchemaResult, ValidationIssues};

/// Validates and transforms raw entry data.
///
/// Implementations return the transformed data on success (unknown keys
/// stripped, defaults applied, and so on) or every issue found.
pub trait Schema: Send + Sync {
    fn parse(&self, data: &Value) -> Result<Value, ValidationIssues>;
}

/// Produces a schema asynchronously, e.g. one derived from a remote API.
#[async_trait]
pub trait SchemaFactory: Send + Sync {
    async fn resolve(&self) -> SchemaResult<Arc<dyn Schema>>;
}

#[async_trait]
impl<F, Fut> SchemaFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = SchemaResult<Arc<dyn Schema>>> + Send,
{
    async fn resolve(&self) -> SchemaResult<Arc<dyn Schema>> {
        (self)().await
    }
}

/// A schema as declared on a collection or loader.
#[derive(Clone)]
pub enum SchemaSource {
    Static(Arc<dyn Schema>),
    Factory(Arc<dyn SchemaFactory>),
}

impl SchemaSource {
    pub fn from_schema(schema: impl Schema + 'static) -> Self {
        Self::Static(Arc::new(schema))
    }

    pub fn from_factory(factory: impl SchemaFactory + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// Resolve to a concrete schema, running the factory if there is one.
    pub async fn resolve(&self) -> SchemaResult<Arc<dyn Schema>> {
        match self {
            Self::Static(schema) => Ok(Arc::clone(schema)),
            Self::Factory(factory) => factory.resolve().await,
        }
    }
}

impl std::fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("SchemaSource::Static"),
            Self::Factory(_) => f.write_str("SchemaSource::Factory"),
        }
    }
}
