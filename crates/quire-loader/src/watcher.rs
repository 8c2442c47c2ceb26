use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::warn;

/// Kind of a file-system change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Add,
    Change,
    Unlink,
}

/// A file-system change forwarded to loaders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_MAX_LISTENERS: usize = 10;

struct WatcherInner {
    sender: broadcast::Sender<WatchEvent>,
    max_listeners: AtomicUsize,
    watched: RwLock<BTreeSet<PathBuf>>,
}

/// Handle to the host's file watcher, passed through to loaders.
///
/// The host owns the actual file-system watch and feeds events in with
/// [`emit`](Self::emit); loaders register interest with
/// [`watch`](Self::watch) and receive events via [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct FileWatcher {
    inner: Arc<WatcherInner>,
}

impl FileWatcher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a watcher whose subscribers buffer up to `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(WatcherInner {
                sender,
                max_listeners: AtomicUsize::new(DEFAULT_MAX_LISTENERS),
                watched: RwLock::new(BTreeSet::new()),
            }),
        }
    }

    /// Number of subscribers above which a leak warning is logged.
    pub fn set_max_listeners(&self, max: usize) {
        self.inner.max_listeners.store(max, Ordering::Relaxed);
    }

    pub fn max_listeners(&self) -> usize {
        self.inner.max_listeners.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        let rx = self.inner.sender.subscribe();
        let count = self.inner.sender.receiver_count();
        let max = self.max_listeners();
        if max > 0 && count > max {
            warn!(count, max, "possible file watcher listener leak");
        }
        rx
    }

    /// Deliver an event to every subscriber. Returns how many received it.
    pub fn emit(&self, event: WatchEvent) -> usize {
        self.inner.sender.send(event).unwrap_or(0)
    }

    /// Register interest in `path`.
    pub fn watch(&self, path: impl AsRef<Path>) {
        self.inner
            .watched
            .write()
            .expect("watcher lock poisoned")
            .insert(path.as_ref().to_path_buf());
    }

    pub fn unwatch(&self, path: impl AsRef<Path>) {
        self.inner
            .watched
            .write()
            .expect("watcher lock poisoned")
            .remove(path.as_ref());
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.inner
            .watched
            .read()
            .expect("watcher lock poisoned")
            .contains(path.as_ref())
    }

    /// Every path some loader registered, sorted.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.inner
            .watched
            .read()
            .expect("watcher lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("subscribers", &self.inner.sender.receiver_count())
            .field("max_listeners", &self.max_listeners())
            .finish()
    }
}
