use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::config::ContentConfig;
use crate::error::ContentError;

/// Lifecycle state of the content config.
#[derive(Clone, Debug, Default)]
pub enum ContentConfigState {
    #[default]
    Init,
    Loading,
    DoesNotExist,
    Loaded(Arc<ContentConfig>),
    Error(Arc<ContentError>),
}

impl ContentConfigState {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Loading => "loading",
            Self::DoesNotExist => "does-not-exist",
            Self::Loaded(_) => "loaded",
            Self::Error(_) => "error",
        }
    }

    /// The config, if loaded.
    pub fn config(&self) -> Option<&Arc<ContentConfig>> {
        match self {
            Self::Loaded(config) => Some(config),
            _ => None,
        }
    }
}

type Subscriber = Arc<dyn Fn(&ContentConfigState) + Send + Sync>;

struct ObservableInner {
    state: RwLock<ContentConfigState>,
    subscribers: RwLock<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

/// Holds the current [`ContentConfigState`] and notifies subscribers on
/// every change.
///
/// Subscribers run synchronously on the thread calling [`set`](Self::set),
/// in the order they subscribed. The list is snapshotted before dispatch,
/// so a callback may subscribe or unsubscribe without deadlocking; such
/// changes take effect from the next `set`.
#[derive(Clone)]
pub struct ContentObservable {
    inner: Arc<ObservableInner>,
}

impl ContentObservable {
    pub fn new(initial: ContentConfigState) -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                state: RwLock::new(initial),
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn get(&self) -> ContentConfigState {
        self.inner
            .state
            .read()
            .expect("observable state lock poisoned")
            .clone()
    }

    /// Replace the state, then notify every subscriber.
    pub fn set(&self, state: ContentConfigState) {
        *self
            .inner
            .state
            .write()
            .expect("observable state lock poisoned") = state.clone();

        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .read()
            .expect("observable subscriber lock poisoned")
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for subscriber in subscribers {
            subscriber(&state);
        }
    }

    /// Register `f`. Registering the same function twice yields two
    /// independent subscriptions.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ContentConfigState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .write()
            .expect("observable subscriber lock poisoned")
            .push((id, Arc::new(f)));
        Subscription {
            id,
            observable: Arc::downgrade(&self.inner),
        }
    }

    /// Remove the subscription with `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: u64) {
        remove_subscriber(&self.inner, id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .expect("observable subscriber lock poisoned")
            .len()
    }
}

impl Default for ContentObservable {
    fn default() -> Self {
        Self::new(ContentConfigState::Init)
    }
}

impl std::fmt::Debug for ContentObservable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentObservable")
            .field("status", &self.get().status())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn remove_subscriber(inner: &ObservableInner, id: u64) {
    inner
        .subscribers
        .write()
        .expect("observable subscriber lock poisoned")
        .retain(|(sid, _)| *sid != id);
}

/// Token returned by [`ContentObservable::subscribe`].
///
/// Dropping it does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    observable: Weak<ObservableInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {
        if let Some(inner) = self.observable.upgrade() {
            remove_subscriber(&inner, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fans_out_in_subscription_order() {
        let observable = ContentObservable::default();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let calls = Arc::clone(&calls);
            observable.subscribe(move |state| {
                calls.lock().unwrap().push((name, state.status()));
            });
        }

        let config = Arc::new(ContentConfig::new().with_digest("d1"));
        observable.set(ContentConfigState::Loaded(config));

        assert_eq!(
            *calls.lock().unwrap(),
            vec![("first", "loaded"), ("second", "loaded")]
        );
        assert_eq!(
            observable.get().config().and_then(|c| c.digest.clone()).as_deref(),
            Some("d1")
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let observable = ContentObservable::default();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        let callback = move |_: &ContentConfigState| {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        let a = observable.subscribe(callback.clone());
        let b = observable.subscribe(callback);
        assert_ne!(a.id(), b.id());

        observable.set(ContentConfigState::Loading);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        a.unsubscribe();
        observable.set(ContentConfigState::DoesNotExist);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        observable.unsubscribe(b.id());
        observable.unsubscribe(b.id());
        observable.set(ContentConfigState::Loading);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(observable.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_subscribe_during_dispatch() {
        let observable = ContentObservable::default();
        let inner = observable.clone();
        observable.subscribe(move |_| {
            inner.subscribe(|_| {});
        });
        observable.set(ContentConfigState::Loading);
        assert_eq!(observable.subscriber_count(), 2);
    }

    #[test]
    fn starts_in_init() {
        let observable = ContentObservable::default();
        assert_eq!(observable.get().status(), "init");
        assert!(observable.get().config().is_none());
    }
}
