use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quire_loader::{WatchEvent, WatchEventKind};
use tokio::sync::mpsc as async_mpsc;
use tracing::warn;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Recursive file-system watch over a project root.
///
/// Events are debounced on a background thread and delivered through the
/// receiver returned by [`ProjectWatcher::start`].
pub struct ProjectWatcher {
    _watcher: RecommendedWatcher,
    _thread: std::thread::JoinHandle<()>,
}

impl ProjectWatcher {
    /// Watch `root` recursively and each of `extra` without recursion,
    /// dropping events under any of `ignored`.
    pub fn start(
        root: &Path,
        extra: &[PathBuf],
        ignored: Vec<PathBuf>,
    ) -> notify::Result<(Self, async_mpsc::UnboundedReceiver<WatchEvent>)> {
        let (notify_tx, notify_rx) = mpsc::channel::<notify::Result<Event>>();
        let (event_tx, event_rx) = async_mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        for dir in extra {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        let thread = std::thread::spawn(move || debounce(notify_rx, event_tx, ignored));
        Ok((
            Self {
                _watcher: watcher,
                _thread: thread,
            },
            event_rx,
        ))
    }
}

fn debounce(
    notify_rx: mpsc::Receiver<notify::Result<Event>>,
    event_tx: async_mpsc::UnboundedSender<WatchEvent>,
    ignored: Vec<PathBuf>,
) {
    let mut pending = Vec::new();
    let mut last_event = Instant::now();

    loop {
        match notify_rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                if let Some(kind) = event_kind(&event.kind) {
                    pending.extend(
                        event
                            .paths
                            .into_iter()
                            .filter(|path| !is_ignored(path, &ignored))
                            .map(|path| WatchEvent::new(path, kind)),
                    );
                }
                last_event = Instant::now();
            }
            Ok(Err(e)) => warn!(error = %e, "file watcher error"),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && last_event.elapsed() >= DEBOUNCE {
                    for event in coalesce(pending.drain(..)) {
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn event_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Add),
        EventKind::Modify(_) => Some(WatchEventKind::Change),
        EventKind::Remove(_) => Some(WatchEventKind::Unlink),
        _ => None,
    }
}

fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    ignored.iter().any(|dir| path.starts_with(dir))
        || path.components().any(|c| c.as_os_str() == ".git")
}

/// One event per path, keeping the latest kind, in first-seen order.
fn coalesce(events: impl IntoIterator<Item = WatchEvent>) -> Vec<WatchEvent> {
    let mut out: Vec<WatchEvent> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    for event in events {
        match index.get(&event.path) {
            Some(&i) => out[i].kind = event.kind,
            None => {
                index.insert(event.path.clone(), out.len());
                out.push(event);
            }
        }
    }
    out
}
