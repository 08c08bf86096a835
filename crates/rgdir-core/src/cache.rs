//! Remote-data cache
//!
//! Keyed store of the most recent result of each query, with at most one
//! request in flight per key. Callers never touch cached values directly;
//! everything goes through [`QueryCache::fetch`], [`QueryCache::invalidate`],
//! and [`QueryCache::patch`].
//!
//! ```text
//! fetch(k) ──► fresh entry? ──yes──► clone
//!                 │no
//!                 ▼
//!           in flight for k? ──yes──► await the shared request
//!                 │no
//!                 ▼
//!           run loader, share it, store Ok result (errors are not stored)
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;

use crate::keys::QueryKey;

/// Capacity of the change-notification channel
const EVENT_CAPACITY: usize = 64;

/// Change notification for views watching the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A loader result was stored under the key
    Stored(QueryKey),
    /// A cached value was patched in place
    Patched(QueryKey),
    /// Entries under the prefix were marked stale
    Invalidated(QueryKey),
    /// Everything was dropped
    Cleared,
}

/// Per-fetch options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Age after which a stored result counts as stale; `None` keeps it
    /// fresh until invalidated
    pub stale_after: Option<Duration>,
}

impl FetchOptions {
    pub fn stale_after(duration: Duration) -> Self {
        Self {
            stale_after: Some(duration),
        }
    }
}

struct Entry<V> {
    value: V,
    fetched_at: Instant,
    stale_after: Option<Duration>,
    invalidated: bool,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        if self.invalidated {
            return false;
        }
        match self.stale_after {
            Some(window) => now.saturating_duration_since(self.fetched_at) < window,
            None => true,
        }
    }
}

type SharedLoad<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Flight<V, E> {
    id: u64,
    load: SharedLoad<V, E>,
    stale_after: Option<Duration>,
    /// An invalidation landed while this request was running
    invalidated: bool,
}

struct CacheState<V, E> {
    entries: HashMap<QueryKey, Entry<V>>,
    in_flight: HashMap<QueryKey, Flight<V, E>>,
    next_flight: u64,
}

/// Process-wide query cache, shared by handle.
///
/// Cloning is cheap and every clone sees the same entries.
pub struct QueryCache<V, E> {
    state: Arc<Mutex<CacheState<V, E>>>,
    events: broadcast::Sender<CacheEvent>,
    default_stale_after: Option<Duration>,
}

impl<V, E> Clone for QueryCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            default_stale_after: self.default_stale_after,
        }
    }
}

impl<V, E> Default for QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + std::fmt::Display + 'static,
{
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V, E> QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + std::fmt::Display + 'static,
{
    /// Create an empty cache. `default_stale_after` applies to [`Self::fetch`].
    pub fn new(default_stale_after: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_flight: 0,
            })),
            events,
            default_stale_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: CacheEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Return the cached value for `key`, running `loader` only when there is
    /// no fresh entry and no request already in flight for the key.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let options = FetchOptions {
            stale_after: self.default_stale_after,
        };
        self.fetch_with(key, options, loader).await
    }

    /// [`Self::fetch`] with explicit options
    pub async fn fetch_with<F, Fut>(
        &self,
        key: QueryKey,
        options: FetchOptions,
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (flight_id, load) = {
            let mut state = self.lock();

            if let Some(entry) = state.entries.get(&key) {
                if entry.is_fresh(Instant::now()) {
                    tracing::debug!(%key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }

            if let Some(flight) = state.in_flight.get(&key) {
                tracing::debug!(%key, "joining in-flight request");
                (flight.id, flight.load.clone())
            } else {
                tracing::debug!(%key, "cache miss, loading");
                let id = state.next_flight;
                state.next_flight += 1;
                let load = loader().boxed().shared();
                state.in_flight.insert(
                    key.clone(),
                    Flight {
                        id,
                        load: load.clone(),
                        stale_after: options.stale_after,
                        invalidated: false,
                    },
                );
                (id, load)
            }
        };

        let result = load.await;
        self.settle(&key, flight_id, &result);
        result
    }

    /// Record the outcome of a finished request. Only the first waiter to get
    /// here for a given flight does any work.
    fn settle(&self, key: &QueryKey, flight_id: u64, result: &Result<V, E>) {
        let mut state = self.lock();
        match state.in_flight.get(key) {
            Some(flight) if flight.id == flight_id => {}
            _ => return,
        }
        let Some(flight) = state.in_flight.remove(key) else {
            return;
        };

        match result {
            Ok(value) => {
                state.entries.insert(
                    key.clone(),
                    Entry {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                        stale_after: flight.stale_after,
                        invalidated: flight.invalidated,
                    },
                );
                drop(state);
                self.notify(CacheEvent::Stored(key.clone()));
            }
            Err(err) => {
                // Prior entry, if any, stays as it was
                tracing::warn!(%key, error = %err, "query failed");
            }
        }
    }

    /// Mark every entry under `prefix` stale. Requests already running for a
    /// matching key finish and are stored as stale.
    ///
    /// Returns the number of entries and requests marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        {
            let mut state = self.lock();
            for (key, entry) in state.entries.iter_mut() {
                if key.starts_with(prefix) {
                    entry.invalidated = true;
                    marked += 1;
                }
            }
            for (key, flight) in state.in_flight.iter_mut() {
                if key.starts_with(prefix) {
                    flight.invalidated = true;
                    marked += 1;
                }
            }
        }
        tracing::debug!(%prefix, marked, "invalidated");
        self.notify(CacheEvent::Invalidated(prefix.clone()));
        marked
    }

    /// Replace the cached value for `key` with `updater(value)` without a
    /// network round trip. No-op when nothing is cached for the key.
    ///
    /// Returns whether an entry was patched.
    pub fn patch<F>(&self, key: &QueryKey, updater: F) -> bool
    where
        F: FnOnce(&V) -> V,
    {
        {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(key) else {
                tracing::debug!(%key, "patch skipped, not cached");
                return false;
            };
            entry.value = updater(&entry.value);
        }
        self.notify(CacheEvent::Patched(key.clone()));
        true
    }

    /// Cached value for `key`, fresh or stale, without loading
    pub fn peek(&self, key: &QueryKey) -> Option<V> {
        self.lock().entries.get(key).map(|e| e.value.clone())
    }

    /// `Some(true)` when an entry exists but would be refetched
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.lock()
            .entries
            .get(key)
            .map(|e| !e.is_fresh(Instant::now()))
    }

    /// Whether a request for `key` is currently running
    pub fn is_loading(&self, key: &QueryKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    /// Drop every entry. Running requests finish but are not stored.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.entries.clear();
            state.in_flight.clear();
        }
        self.notify(CacheEvent::Cleared);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
