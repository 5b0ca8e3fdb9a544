//! Polling query cache.
//!
//! Each `QueryCache` holds one data kind (processes, active fault, fault
//! types, ...) with its own refresh cadence. Entries are keyed by whatever
//! identifies the remote resource, typically an oven id plus locale. Every
//! subscription to a key shares one poller and at most one in-flight fetch.
//!
//! Snapshots are swapped whole inside a `watch` channel. When two fetches for
//! a key overlap in time the one that completes last wins; coalescing keeps
//! that from happening within a single key, and there is no sequence check
//! beyond it.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{Arc, Weak},
    time::Duration,
};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

pub type FetchFuture<T> = BoxFuture<'static, ClientResult<T>>;
type FetchFn<K, T> = Arc<dyn Fn(K) -> FetchFuture<T> + Send + Sync>;

pub trait CacheKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<K> CacheKey for K where K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Poll while subscribed. `None` fetches on subscribe when stale.
    pub refetch_interval: Option<Duration>,
    pub stale_time: Duration,
}

impl QueryOptions {
    pub fn polling(every: Duration) -> Self {
        Self {
            refetch_interval: Some(every),
            stale_time: Duration::ZERO,
        }
    }

    pub fn cached(stale_time: Duration) -> Self {
        Self {
            refetch_interval: None,
            stale_time,
        }
    }
}

#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<ClientError>,
    pub is_fetching: bool,
    pub updated_at: Option<Instant>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            updated_at: None,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            updated_at: self.updated_at,
        }
    }
}

impl<T> QueryState<T> {
    /// First load: nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(at) => at.elapsed() >= stale_time,
            None => true,
        }
    }
}

struct Entry<K, T> {
    state: watch::Sender<QueryState<T>>,
    fetch: Option<FetchFn<K, T>>,
    subscribers: usize,
    in_flight: bool,
    poller: Option<JoinHandle<()>>,
}

impl<K, T> Entry<K, T> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            state,
            fetch: None,
            subscribers: 0,
            in_flight: false,
            poller: None,
        }
    }
}

struct Inner<K, T> {
    name: &'static str,
    options: QueryOptions,
    entries: Mutex<HashMap<K, Entry<K, T>>>,
}

impl<K: CacheKey, T: Send + Sync + 'static> Inner<K, T> {
    /// Starts a fetch for `key` unless one is already running.
    fn start_fetch(self: &Arc<Self>, key: &K) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            self.start_fetch_locked(key, entry);
        }
    }

    fn start_fetch_locked(self: &Arc<Self>, key: &K, entry: &mut Entry<K, T>) {
        if entry.in_flight {
            debug!(cache = self.name, ?key, "coalesced fetch into in-flight request");
            return;
        }
        let Some(fetch) = entry.fetch.clone() else {
            return;
        };
        entry.in_flight = true;
        entry.state.send_modify(|state| state.is_fetching = true);

        let inner = Arc::clone(self);
        let key = key.clone();
        tokio::spawn(async move {
            let result = fetch(key.clone()).await;
            inner.complete(&key, result);
        });
    }

    fn complete(&self, key: &K, result: ClientResult<T>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.in_flight = false;
        match result {
            Ok(data) => {
                entry.state.send_replace(QueryState {
                    data: Some(Arc::new(data)),
                    error: None,
                    is_fetching: false,
                    updated_at: Some(Instant::now()),
                });
            }
            Err(err) => {
                warn!(cache = self.name, ?key, error = %err, "query fetch failed; keeping last snapshot");
                entry.state.send_modify(|state| {
                    state.error = Some(err);
                    state.is_fetching = false;
                });
            }
        }
    }

    fn unsubscribe(&self, key: &K) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            if let Some(poller) = entry.poller.take() {
                debug!(cache = self.name, ?key, "last subscriber left; polling stopped");
                poller.abort();
            }
        }
    }
}

async fn poll<K: CacheKey, T: Send + Sync + 'static>(
    inner: Weak<Inner<K, T>>,
    key: K,
    every: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.start_fetch(&key);
    }
}

pub struct QueryCache<K, T> {
    inner: Arc<Inner<K, T>>,
}

impl<K, T> Clone for QueryCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: CacheKey, T: Send + Sync + 'static> QueryCache<K, T> {
    pub fn new(name: &'static str, options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                options,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.inner.options
    }

    /// Mounts a consumer on `key`. A `None` key is a disabled query: it never
    /// touches the network and reports an empty state.
    pub fn subscribe<F>(&self, key: Option<K>, fetch: F) -> Subscription<K, T>
    where
        F: Fn(K) -> FetchFuture<T> + Send + Sync + 'static,
    {
        let Some(key) = key else {
            let (_, receiver) = watch::channel(QueryState::default());
            return Subscription {
                key: None,
                cache: None,
                receiver,
            };
        };

        let inner = &self.inner;
        let mut entries = inner.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.fetch = Some(Arc::new(fetch));
        entry.subscribers += 1;
        let receiver = entry.state.subscribe();

        match inner.options.refetch_interval {
            Some(every) => {
                if entry.poller.is_none() {
                    inner.start_fetch_locked(&key, entry);
                    entry.poller = Some(tokio::spawn(poll(
                        Arc::downgrade(inner),
                        key.clone(),
                        every,
                    )));
                }
            }
            None => {
                if entry.state.borrow().is_stale(inner.options.stale_time) {
                    inner.start_fetch_locked(&key, entry);
                }
            }
        }
        drop(entries);

        Subscription {
            key: Some(key),
            cache: Some(Arc::clone(inner)),
            receiver,
        }
    }

    /// Refreshes a key now if anyone is watching it; otherwise marks it stale
    /// so the next subscriber fetches.
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.subscribers > 0 {
            self.inner.start_fetch_locked(key, entry);
        } else {
            entry.state.send_modify(|state| state.updated_at = None);
        }
    }

    pub fn peek(&self, key: &K) -> Option<Arc<T>> {
        let entries = self.inner.entries.lock();
        entries
            .get(key)
            .and_then(|entry| entry.state.borrow().data.clone())
    }

    pub fn subscriber_count(&self, key: &K) -> usize {
        let entries = self.inner.entries.lock();
        entries.get(key).map_or(0, |entry| entry.subscribers)
    }
}

/// A mounted consumer of one cache key. Dropping it unmounts; the last
/// drop for a key stops its poller.
pub struct Subscription<K: CacheKey, T: Send + Sync + 'static> {
    key: Option<K>,
    cache: Option<Arc<Inner<K, T>>>,
    receiver: watch::Receiver<QueryState<T>>,
}

impl<K: CacheKey, T: Send + Sync + 'static> Subscription<K, T> {
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    pub fn state(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.receiver.borrow().data.clone()
    }

    pub fn error(&self) -> Option<ClientError> {
        self.receiver.borrow().error.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.receiver.borrow().is_fetching
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading()
    }

    /// Manual retry. Joins an in-flight fetch instead of starting another and
    /// resolves with the state after it lands.
    pub async fn refetch(&self) -> QueryState<T> {
        let (Some(key), Some(cache)) = (&self.key, &self.cache) else {
            return self.state();
        };
        cache.start_fetch(key);
        let mut receiver = self.receiver.clone();
        let settled = receiver.wait_for(|state| !state.is_fetching).await;
        match settled {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Waits for the next snapshot change. Returns `false` for a disabled
    /// subscription, which never changes.
    pub async fn changed(&mut self) -> bool {
        if self.key.is_none() {
            return false;
        }
        self.receiver.changed().await.is_ok()
    }
}

impl<K: CacheKey, T: Send + Sync + 'static> Drop for Subscription<K, T> {
    fn drop(&mut self) {
        if let (Some(key), Some(cache)) = (&self.key, &self.cache) {
            cache.unsubscribe(key);
        }
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
