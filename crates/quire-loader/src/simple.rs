use quire_types::DataEntry;
use serde_json::Value;

use crate::context::{LoaderContext, ParseDataOptions};
use crate::error::{LoaderError, LoaderResult};
use crate::loader::EntrySource;

/// Run a "fetch all" loader against a collection.
///
/// Every call is a full snapshot: the collection is cleared, then each record
/// is validated through `parse_data` and inserted under its `id`. Records are
/// fetched before the clear, so a failing source leaves the store untouched.
pub async fn simple_loader<S>(source: &S, context: &LoaderContext) -> LoaderResult<()>
where
    S: EntrySource + ?Sized,
{
    let records = source.entries().await?;
    context.store.clear();

    for (index, raw) in records.into_iter().enumerate() {
        let id = record_id(&raw).ok_or_else(|| LoaderError::MissingId {
            collection: context.collection.clone(),
            index,
        })?;
        let data = context
            .parse_data
            .parse(ParseDataOptions::new(id.clone(), raw))
            .await?;
        context.store.set(DataEntry::new(id, data));
    }
    Ok(())
}

fn record_id(raw: &Value) -> Option<String> {
    raw.get("id").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LoaderContextBuilder, ParseData};
    use crate::loader::FunctionLoader;
    use quire_config::ProjectConfig;
    use quire_schema::{Field, ObjectSchema};
    use quire_store::{DataStore, InMemoryDataStore};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn context(store: &InMemoryDataStore, parse_data: ParseData) -> LoaderContext {
        LoaderContextBuilder::new(Arc::new(store.clone()), Arc::new(ProjectConfig::default()))
            .build("posts", "posts", parse_data, None)
    }

    #[tokio::test]
    async fn second_run_replaces_the_collection() {
        let store = InMemoryDataStore::new();
        let ctx = context(&store, ParseData::new("posts", None));
        let outputs = Arc::new(Mutex::new(vec![
            vec![json!({"id": "b", "n": 2})],
            vec![json!({"id": "a", "n": 1}), json!({"id": "b", "n": 2})],
        ]));
        let loader = {
            let outputs = Arc::clone(&outputs);
            FunctionLoader::new(move || {
                let next = outputs.lock().unwrap().pop().unwrap_or_default();
                async move { Ok::<_, LoaderError>(next) }
            })
        };

        simple_loader(&loader, &ctx).await.unwrap();
        let mut keys = ctx.store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        simple_loader(&loader, &ctx).await.unwrap();
        assert_eq!(ctx.store.keys(), vec!["b"]);
        assert_eq!(store.values("posts").len(), 1);
    }

    #[tokio::test]
    async fn records_pass_through_schema() {
        let store = InMemoryDataStore::new();
        let schema = ObjectSchema::new().field("title", Field::string());
        let ctx = context(&store, ParseData::new("posts", Some(Arc::new(schema))));
        let loader =
            FunctionLoader::new(|| async { Ok::<_, LoaderError>(vec![json!({"id": "p1", "title": "Hello"})]) });

        simple_loader(&loader, &ctx).await.unwrap();
        let entry = ctx.store.get("p1").unwrap();
        assert_eq!(entry.data, json!({"title": "Hello"}));
    }

    #[tokio::test]
    async fn invalid_record_fails() {
        let store = InMemoryDataStore::new();
        let schema = ObjectSchema::new().field("title", Field::string());
        let ctx = context(&store, ParseData::new("posts", Some(Arc::new(schema))));
        let loader = FunctionLoader::new(|| async { Ok::<_, LoaderError>(vec![json!({"id": "p1", "title": 3})]) });

        let err = simple_loader(&loader, &ctx).await.unwrap_err();
        assert!(matches!(err, LoaderError::InvalidEntry { ref id, .. } if id == "p1"));
    }

    #[tokio::test]
    async fn missing_id_fails() {
        let store = InMemoryDataStore::new();
        let ctx = context(&store, ParseData::new("posts", None));
        let loader = FunctionLoader::new(|| async {
            Ok::<_, LoaderError>(vec![json!({"id": "ok"}), json!({"id": 7})])
        });

        let err = simple_loader(&loader, &ctx).await.unwrap_err();
        assert!(matches!(err, LoaderError::MissingId { index: 1, .. }));
    }

    #[tokio::test]
    async fn failing_source_keeps_previous_entries() {
        let store = InMemoryDataStore::new();
        let ctx = context(&store, ParseData::new("posts", None));
        ctx.store.set(quire_types::DataEntry::new("old", json!({})));
        let loader = FunctionLoader::new(|| async {
            Err::<Vec<Value>, _>(LoaderError::Other(anyhow::anyhow!("feed offline")))
        });

        assert!(simple_loader(&loader, &ctx).await.is_err());
        assert!(ctx.store.has("old"));
    }
}
