use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll};

use quire_config::ProjectConfig;
use quire_content::{CollectionConfig, ContentConfigState, ContentObservable, Subscription};
use quire_digest::DigestGenerator;
use quire_loader::{
    simple_loader, CollectionLoader, FileWatcher, IntegrationLogger, LoaderContextBuilder,
    LoaderError, ParseData,
};
use quire_store::DataStore;
use quire_types::{ASSET_IMPORTS_FILE, CONFIG_DIGEST_KEY, MODULES_IMPORTS_FILE, QUIRE_VERSION, VERSION_KEY};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::manifest::regenerate_collection_file_manifest;
use crate::options::SyncOptions;
use crate::paths::data_store_file;

/// Listener hint set on the file watcher; every loader may subscribe.
const WATCHER_MAX_LISTENERS: usize = 50;

/// Logger label for loaders that have no name of their own.
const DEFAULT_LOADER_NAME: &str = "content";

/// Collaborators of a [`ContentLayer`].
pub struct ContentLayerOptions {
    pub settings: Arc<ProjectConfig>,
    pub store: Arc<dyn DataStore>,
    pub observer: ContentObservable,
    pub watcher: Option<FileWatcher>,
}

enum Job {
    Sync {
        options: SyncOptions,
        respond: oneshot::Sender<SyncResult<()>>,
    },
    /// Answered once every job queued before it has finished.
    Barrier(oneshot::Sender<()>),
}

/// Sending half of the sync queue.
#[derive(Clone)]
struct Queue {
    jobs: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
}

impl Queue {
    fn enqueue(&self, options: SyncOptions) -> SyncHandle {
        let (respond, receiver) = oneshot::channel();
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.jobs.send(Job::Sync { options, respond }).is_err() {
            // The job, and with it the responder, is dropped: the handle
            // resolves to `QueueClosed`.
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        SyncHandle { receiver }
    }
}

/// Completion of one enqueued sync.
///
/// The sync runs whether or not the handle is awaited.
#[must_use = "the sync runs regardless; await the handle to observe its result"]
pub struct SyncHandle {
    receiver: oneshot::Receiver<SyncResult<()>>,
}

impl Future for SyncHandle {
    type Output = SyncResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(SyncError::QueueClosed)))
    }
}

/// State read by the queue worker.
struct Shared {
    settings: Arc<ProjectConfig>,
    store: Arc<dyn DataStore>,
    observer: ContentObservable,
    watcher: Option<FileWatcher>,
    logger: IntegrationLogger,
    digest: OnceLock<DigestGenerator>,
    last_config_digest: Arc<Mutex<Option<String>>>,
}

/// Loads content layer collections into the data store.
pub struct ContentLayer {
    shared: Arc<Shared>,
    queue: Queue,
    subscription: Mutex<Option<Subscription>>,
}

impl ContentLayer {
    /// Create the orchestrator and start its queue worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(options: ContentLayerOptions) -> Self {
        if let Some(watcher) = &options.watcher {
            watcher.set_max_listeners(WATCHER_MAX_LISTENERS);
        }
        let shared = Arc::new(Shared {
            settings: options.settings,
            store: options.store,
            observer: options.observer,
            watcher: options.watcher,
            logger: IntegrationLogger::default(),
            digest: OnceLock::new(),
            last_config_digest: Arc::new(Mutex::new(None)),
        });

        let (jobs, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_queue(Arc::clone(&shared), receiver, Arc::clone(&pending)));

        Self {
            shared,
            queue: Queue { jobs, pending },
            subscription: Mutex::new(None),
        }
    }

    /// Enqueue a sync.
    ///
    /// The job is queued when this is called, not when the handle is first
    /// polled. Every call queues its own job.
    pub fn sync(&self, options: SyncOptions) -> SyncHandle {
        self.queue.enqueue(options)
    }

    /// Resolves once every sync queued before this call has finished.
    ///
    /// Resolves immediately if the queue worker has stopped.
    pub async fn idle(&self) {
        let (respond, receiver) = oneshot::channel();
        if self.queue.jobs.send(Job::Barrier(respond)).is_ok() {
            let _ = receiver.await;
        }
    }

    /// Whether a sync is queued or running.
    pub fn loading(&self) -> bool {
        self.queue.pending.load(Ordering::SeqCst) > 0
    }

    /// Sync whenever the observed config is loaded with a digest this layer
    /// has not synced yet. Replaces any previous subscription.
    pub fn watch_content_config(&self) {
        self.unwatch_content_config();

        let queue = self.queue.clone();
        let last = Arc::clone(&self.shared.last_config_digest);
        let subscription = self.shared.observer.subscribe(move |state| {
            let ContentConfigState::Loaded(config) = state else {
                return;
            };
            let changed = *last.lock().expect("config digest lock poisoned") != config.digest;
            if changed {
                // Fire and forget; the handle is not awaited.
                let _ = queue.enqueue(SyncOptions::default());
            }
        });
        *self.subscription.lock().expect("subscription lock poisoned") = Some(subscription);
    }

    pub fn unwatch_content_config(&self) {
        if let Some(subscription) = self
            .subscription
            .lock()
            .expect("subscription lock poisoned")
            .take()
        {
            subscription.unsubscribe();
        }
    }

    /// Update the collection file manifest from the current store.
    /// Failures are logged, never returned.
    pub async fn regenerate_collection_file_manifest(&self) {
        regenerate_collection_file_manifest(&self.shared.settings, self.shared.store.as_ref()).await;
    }

    /// Digest of the config this layer last synced with.
    pub fn last_config_digest(&self) -> Option<String> {
        self.shared
            .last_config_digest
            .lock()
            .expect("config digest lock poisoned")
            .clone()
    }
}

impl Drop for ContentLayer {
    fn drop(&mut self) {
        self.unwatch_content_config();
    }
}

impl std::fmt::Debug for ContentLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentLayer")
            .field("loading", &self.loading())
            .field("last_config_digest", &self.last_config_digest())
            .finish_non_exhaustive()
    }
}

async fn run_queue(
    shared: Arc<Shared>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Sync { options, respond } => {
                let result = shared.do_sync(options).await;
                pending.fetch_sub(1, Ordering::SeqCst);
                // The caller may have dropped its handle.
                let _ = respond.send(result);
            }
            Job::Barrier(respond) => {
                let _ = respond.send(());
            }
        }
    }
    debug!("sync queue closed");
}

impl Shared {
    fn generate_digest(&self) -> DigestGenerator {
        *self.digest.get_or_init(DigestGenerator::new)
    }

    async fn do_sync(&self, options: SyncOptions) -> SyncResult<()> {
        let logger = self.logger.fork("content");
        let ContentConfigState::Loaded(config) = self.observer.get() else {
            logger.debug("Content config not loaded, skipping sync");
            return Ok(());
        };

        if !self.settings.experimental.content_layer {
            let collections: Vec<String> = config
                .content_layer_collections()
                .map(|(name, _)| name.to_string())
                .collect();
            if !collections.is_empty() {
                return Err(SyncError::ContentLayerDisabled { collections });
            }
            return Ok(());
        }

        logger.info("Syncing content");
        let current_digest = config.digest.clone();
        *self
            .last_config_digest
            .lock()
            .expect("config digest lock poisoned") = current_digest.clone();

        let meta = self.store.meta_store(None);
        let mut should_clear = false;
        if let Some(digest) = &current_digest {
            if meta.get(CONFIG_DIGEST_KEY).as_ref() != Some(digest) {
                logger.info("Content config changed");
                should_clear = true;
            }
        }
        if meta.get(VERSION_KEY).as_deref() != Some(QUIRE_VERSION) {
            logger.info("quire version changed");
            should_clear = true;
        }
        if should_clear {
            logger.info("Clearing content store");
            self.store.clear_all();
        }
        meta.set(VERSION_KEY, QUIRE_VERSION);
        if let Some(digest) = &current_digest {
            meta.set(CONFIG_DIGEST_KEY, digest);
        }

        let builder = LoaderContextBuilder::new(Arc::clone(&self.store), Arc::clone(&self.settings))
            .logger(self.logger.clone())
            .watcher(self.watcher.clone())
            .digest(self.generate_digest());

        let mut loads = JoinSet::new();
        for (name, collection) in config.content_layer_collections() {
            let name = name.to_string();
            let collection = collection.clone();
            let builder = builder.clone();
            let options = options.clone();
            loads.spawn(async move {
                let result = load_collection(&name, collection, &builder, &options).await;
                (name, result)
            });
        }
        while let Some(joined) = loads.join_next().await {
            let failure = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((_, Err(e))) => e,
                Err(e) => SyncError::Task(e.to_string()),
            };
            loads.abort_all();
            // Let aborted loaders stop before the next queued sync starts.
            while loads.join_next().await.is_some() {}
            return Err(failure);
        }

        self.persist().await?;
        logger.info("Synced content");

        if self.settings.experimental.content_intellisense {
            regenerate_collection_file_manifest(&self.settings, self.store.as_ref()).await;
        }
        Ok(())
    }

    async fn persist(&self) -> SyncResult<()> {
        let cache_file = data_store_file(&self.settings, None);
        create_dir(&self.settings.cache_dir()).await?;
        if let Some(parent) = cache_file.parent() {
            create_dir(parent).await?;
        }
        self.store.write_to_disk(&cache_file).await?;

        let generated = self.settings.generated_dir();
        create_dir(&generated).await?;
        self.store
            .write_asset_imports(&generated.join(ASSET_IMPORTS_FILE))
            .await?;
        self.store
            .write_module_imports(&generated.join(MODULES_IMPORTS_FILE))
            .await?;
        Ok(())
    }
}

async fn create_dir(path: &std::path::Path) -> SyncResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Run one collection's loader.
async fn load_collection(
    name: &str,
    collection: CollectionConfig,
    builder: &LoaderContextBuilder,
    options: &SyncOptions,
) -> SyncResult<()> {
    let Some(loader) = collection.loader else {
        return Err(SyncError::MissingLoad {
            collection: name.to_string(),
        });
    };

    let schema = match collection.schema.as_ref().or_else(|| loader.schema()) {
        Some(source) => Some(source.resolve().await.map_err(|source| LoaderError::Schema {
            collection: name.to_string(),
            source,
        })?),
        None => None,
    };

    if !options.allows(loader.name()) {
        debug!(collection = name, "loader not in allowlist, skipping");
        return Ok(());
    }

    let context = builder.build(
        name,
        loader.name().unwrap_or(DEFAULT_LOADER_NAME),
        ParseData::new(name, schema),
        options.context.clone(),
    );

    match loader {
        CollectionLoader::Function(function) => simple_loader(&function, &context).await?,
        CollectionLoader::Object(object) => {
            let Some(load) = object.load else {
                return Err(SyncError::MissingLoad {
                    collection: name.to_string(),
                });
            };
            load.load(context).await?;
        }
    }
    Ok(())
}
