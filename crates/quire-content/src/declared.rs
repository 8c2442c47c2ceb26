use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use quire_config::{CollectionDecl, ConfigError, FieldDecl, FieldTypeName, LoaderDecl, ProjectConfig};
use quire_loader::FileLoader;
use quire_schema::{Field, FieldKind, ObjectSchema, SchemaSource};
use quire_types::CollectionType;

use crate::config::{CollectionConfig, ContentConfig};
use crate::error::{ContentError, ContentResult};
use crate::reload::{ConfigSource, LoadedConfig};

/// Collections declared under `[collections]` in a `quire.toml` file.
#[derive(Clone, Debug)]
pub struct DeclaredConfigSource {
    path: PathBuf,
}

impl DeclaredConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for DeclaredConfigSource {
    async fn load(&self) -> ContentResult<Option<LoadedConfig>> {
        let source_text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(self.path.clone(), e).into()),
        };
        let project = ProjectConfig::from_toml(&source_text)?;
        project.validate()?;
        Ok(Some(LoadedConfig {
            config: collections_from_declarations(&project.collections)?,
            source_text,
        }))
    }
}

/// Build a [`ContentConfig`] from declarative collection tables.
pub fn collections_from_declarations(
    declarations: &BTreeMap<String, CollectionDecl>,
) -> ContentResult<ContentConfig> {
    let mut config = ContentConfig::new();
    for (name, decl) in declarations {
        let mut collection = match (decl.kind, &decl.loader) {
            (CollectionType::ContentLayer, Some(LoaderDecl::File(path))) => {
                CollectionConfig::content_layer(FileLoader::new(path).into_loader())
            }
            (CollectionType::ContentLayer, None) => {
                return Err(ContentError::InvalidConfig(format!(
                    "collection `{name}` has no loader"
                )));
            }
            (CollectionType::Content, _) => CollectionConfig::content(),
            (CollectionType::Data, _) => CollectionConfig::data(),
        };
        if let Some(fields) = &decl.schema {
            collection = collection.with_schema(SchemaSource::from_schema(object_schema(fields)));
        }
        config.collections.insert(name.clone(), collection);
    }
    Ok(config)
}

fn object_schema(fields: &BTreeMap<String, FieldDecl>) -> ObjectSchema {
    fields
        .iter()
        .fold(ObjectSchema::new(), |schema, (name, decl)| {
            schema.field(name.clone(), field(decl))
        })
}

fn field(decl: &FieldDecl) -> Field {
    match decl {
        FieldDecl::Short(kind) => Field::new(field_kind(*kind, None)),
        FieldDecl::Full {
            kind,
            required,
            default,
            items,
        } => {
            let mut field = Field::new(field_kind(*kind, *items));
            if !required {
                field = field.optional();
            }
            if let Some(value) = default {
                field = field.default(value.clone());
            }
            field
        }
    }
}

fn field_kind(kind: FieldTypeName, items: Option<FieldTypeName>) -> FieldKind {
    match kind {
        FieldTypeName::String => FieldKind::String,
        FieldTypeName::Number => FieldKind::Number,
        FieldTypeName::Boolean => FieldKind::Boolean,
        FieldTypeName::Any => FieldKind::Any,
        FieldTypeName::Image => FieldKind::Image,
        FieldTypeName::Array => {
            let items = items.map_or(FieldKind::Any, |item| field_kind(item, None));
            FieldKind::Array(Box::new(items))
        }
    }
}
