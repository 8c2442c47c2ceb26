use std::sync::{Arc, Mutex};

use crate::layer::{ContentLayer, ContentLayerOptions};

/// Owns the process's active [`ContentLayer`], if any.
///
/// Create one per server or CLI process and pass it to whatever needs the
/// layer; there is no global instance.
#[derive(Default)]
pub struct ContentLayerHost {
    current: Mutex<Option<Arc<ContentLayer>>>,
}

impl ContentLayerHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active layer. The previous one stops watching the content
    /// config.
    pub fn init(&self, options: ContentLayerOptions) -> Arc<ContentLayer> {
        let layer = Arc::new(ContentLayer::new(options));
        let previous = self
            .current
            .lock()
            .expect("content layer host lock poisoned")
            .replace(Arc::clone(&layer));
        if let Some(previous) = previous {
            previous.unwatch_content_config();
        }
        layer
    }

    pub fn get(&self) -> Option<Arc<ContentLayer>> {
        self.current
            .lock()
            .expect("content layer host lock poisoned")
            .clone()
    }

    pub fn dispose(&self) {
        let previous = self
            .current
            .lock()
            .expect("content layer host lock poisoned")
            .take();
        if let Some(previous) = previous {
            previous.unwatch_content_config();
        }
    }
}

impl std::fmt::Debug for ContentLayerHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentLayerHost")
            .field("active", &self.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_config::ProjectConfig;
    use quire_content::ContentObservable;
    use quire_store::InMemoryDataStore;

    fn options(observer: &ContentObservable) -> ContentLayerOptions {
        ContentLayerOptions {
            settings: Arc::new(ProjectConfig::default()),
            store: Arc::new(InMemoryDataStore::new()),
            observer: observer.clone(),
            watcher: None,
        }
    }

    #[tokio::test]
    async fn init_replaces_and_unwatches_previous() {
        let host = ContentLayerHost::new();
        let observer = ContentObservable::default();
        assert!(host.get().is_none());

        let first = host.init(options(&observer));
        first.watch_content_config();
        assert_eq!(observer.subscriber_count(), 1);

        let second = host.init(options(&observer));
        assert_eq!(observer.subscriber_count(), 0);
        assert!(Arc::ptr_eq(&host.get().unwrap(), &second));

        second.watch_content_config();
        host.dispose();
        assert!(host.get().is_none());
        assert_eq!(observer.subscriber_count(), 0);
    }
}
