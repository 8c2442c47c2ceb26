use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use quire_schema::SchemaSource;
use serde_json::Value;

use crate::context::LoaderContext;
use crate::error::LoaderResult;

/// Produces every entry of a collection at once.
///
/// Each record is a JSON object carrying a string `id`.
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn entries(&self) -> LoaderResult<Vec<Value>>;
}

#[async_trait]
impl<F, Fut> EntrySource for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = LoaderResult<Vec<Value>>> + Send,
{
    async fn entries(&self) -> LoaderResult<Vec<Value>> {
        (self)().await
    }
}

/// The `load` step of an object loader. It owns the collection's store for
/// the duration of the call.
#[async_trait]
pub trait ObjectLoad: Send + Sync {
    async fn load(&self, context: LoaderContext) -> LoaderResult<()>;
}

#[async_trait]
impl<F, Fut> ObjectLoad for F
where
    F: Fn(LoaderContext) -> Fut + Send + Sync,
    Fut: Future<Output = LoaderResult<()>> + Send,
{
    async fn load(&self, context: LoaderContext) -> LoaderResult<()> {
        (self)(context).await
    }
}

/// A loader given as a plain "fetch all entries" function.
#[derive(Clone)]
pub struct FunctionLoader {
    source: Arc<dyn EntrySource>,
}

impl FunctionLoader {
    pub fn new(source: impl EntrySource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub async fn entries(&self) -> LoaderResult<Vec<Value>> {
        self.source.entries().await
    }
}

#[async_trait]
impl EntrySource for FunctionLoader {
    async fn entries(&self) -> LoaderResult<Vec<Value>> {
        self.source.entries().await
    }
}

/// A named loader that manages its collection's store itself.
#[derive(Clone)]
pub struct ObjectLoader {
    pub name: String,
    pub load: Option<Arc<dyn ObjectLoad>>,
    /// Used when the collection declares no schema of its own.
    pub schema: Option<SchemaSource>,
}

impl ObjectLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load: None,
            schema: None,
        }
    }

    pub fn with_load(mut self, load: impl ObjectLoad + 'static) -> Self {
        self.load = Some(Arc::new(load));
        self
    }

    pub fn with_schema(mut self, schema: SchemaSource) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A collection's loader, resolved once per sync by variant.
#[derive(Clone)]
pub enum CollectionLoader {
    Function(FunctionLoader),
    Object(ObjectLoader),
}

impl CollectionLoader {
    pub fn function(source: impl EntrySource + 'static) -> Self {
        Self::Function(FunctionLoader::new(source))
    }

    pub fn object(loader: ObjectLoader) -> Self {
        Self::Object(loader)
    }

    /// Name of an object loader. Function loaders are anonymous.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function(_) => None,
            Self::Object(loader) => Some(&loader.name),
        }
    }

    pub fn schema(&self) -> Option<&SchemaSource> {
        match self {
            Self::Function(_) => None,
            Self::Object(loader) => loader.schema.as_ref(),
        }
    }
}

impl From<FunctionLoader> for CollectionLoader {
    fn from(loader: FunctionLoader) -> Self {
        Self::Function(loader)
    }
}

impl From<ObjectLoader> for CollectionLoader {
    fn from(loader: ObjectLoader) -> Self {
        Self::Object(loader)
    }
}

impl std::fmt::Debug for CollectionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(_) => f.write_str("CollectionLoader::Function"),
            Self::Object(loader) => f
                .debug_struct("CollectionLoader::Object")
                .field("name", &loader.name)
                .field("has_load", &loader.load.is_some())
                .field("schema", &loader.schema)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use quire_schema::{Field, ObjectSchema};
    use serde_json::json;

    #[tokio::test]
    async fn function_loader_from_closure() {
        let loader = FunctionLoader::new(|| async { Ok::<_, LoaderError>(vec![json!({"id": "a"})]) });
        assert_eq!(loader.entries().await.unwrap(), vec![json!({"id": "a"})]);
    }

    #[test]
    fn names_and_schemas() {
        let function = CollectionLoader::function(|| async { Ok::<_, LoaderError>(Vec::new()) });
        assert_eq!(function.name(), None);
        assert!(function.schema().is_none());

        let object = CollectionLoader::object(
            ObjectLoader::new("feed")
                .with_load(|_ctx: LoaderContext| async { Ok::<_, LoaderError>(()) })
                .with_schema(SchemaSource::from_schema(
                    ObjectSchema::new().field("title", Field::string()),
                )),
        );
        assert_eq!(object.name(), Some("feed"));
        assert!(object.schema().is_some());
        assert!(format!("{object:?}").contains("feed"));
    }

    #[test]
    fn object_loader_without_load() {
        let loader = ObjectLoader::new("broken");
        assert!(loader.load.is_none());
    }
}
