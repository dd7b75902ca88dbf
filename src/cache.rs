//! Generic TTL cache with singleflight fills and stale fallback.
//!
//! Mirrors the `DashMap` entry pattern used for response caches: each key maps
//! to `(cached_at, ttl, Arc<V>)`, so readers only ever see whole values.
//!
//! Misses for the same key are collapsed behind a per-key [`Flight`]. Whoever
//! takes its lock starts the upstream call on its own task, so the fill runs
//! to completion even if that caller goes away. Callers queued behind the
//! fill share its outcome: the fresh entry on success, the same error (or the
//! stale value) on failure. Only a lookup that starts after a failed fill has
//! finished goes upstream again.
//!
//! Failure handling is chosen per call:
//!
//! - [`TtlCache::get_or_compute`] propagates the error.
//! - [`TtlCache::get_or_else`] serves a caller-built default that is never
//!   stored, so the next lookup retries upstream.
//!
//! In both cases a stale entry is served first when the cache was built with
//! [`StalePolicy::ServeStale`].

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

/// What to do with an expired entry when refreshing it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Serve the expired value. Its timestamp is left untouched so the next
    /// lookup tries upstream again.
    #[default]
    ServeStale,
    /// Ignore expired values entirely.
    Discard,
}

#[derive(Debug)]
struct Entry<V> {
    cached_at: Instant,
    ttl: Duration,
    value: Arc<V>,
}

impl<V> Entry<V> {
    fn is_fresh(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Per-key fill state.
#[derive(Debug)]
struct Flight<E> {
    /// Held for the whole upstream call. Guards the error of the last fill,
    /// `None` when it succeeded.
    last_failure: Arc<Mutex<Option<Arc<E>>>>,
    /// Bumped when a fill finishes, before its lock is released.
    generation: AtomicU64,
}

impl<E> Flight<E> {
    fn new() -> Self {
        Self {
            last_failure: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }
}

/// Keyed cache shared across requests. Clone-cheap.
///
/// `E` is the upstream error type; errors are handed out as `Arc<E>` because
/// every caller that joined a failed fill receives the same one.
#[derive(Debug)]
pub struct TtlCache<V, E> {
    entries: Arc<DashMap<String, Entry<V>>>,
    inflight: Arc<DashMap<String, Arc<Flight<E>>>>,
    stale: StalePolicy,
}

impl<V, E> Clone for TtlCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            inflight: self.inflight.clone(),
            stale: self.stale,
        }
    }
}

impl<V, E> Default for TtlCache<V, E> {
    fn default() -> Self {
        Self::new(StalePolicy::default())
    }
}

impl<V, E> TtlCache<V, E> {
    pub fn new(stale: StalePolicy) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
            stale,
        }
    }

    /// Return a cached value if it exists and is fresh.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let entry = self.entries.get(key)?;
        entry.is_fresh().then(|| entry.value.clone())
    }

    /// Return a cached value even if it has expired.
    pub fn get_stale(&self, key: &str) -> Option<Arc<V>> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Store a fresh value, replacing whatever was there.
    pub fn insert(&self, key: String, value: V, ttl: Duration) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(
            key,
            Entry {
                cached_at: Instant::now(),
                ttl,
                value: value.clone(),
            },
        );
        value
    }

    /// Drop a single entry. Returns whether anything was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove every expired entry and return how many went away.
    ///
    /// Fill state for keys without an entry is dropped as well, unless a
    /// fill or a waiter still holds it.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        self.inflight
            .retain(|key, flight| self.entries.contains_key(key) || Arc::strong_count(flight) > 1);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn flight(&self, key: &str) -> Arc<Flight<E>> {
        self.inflight
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Flight::new()))
            .clone()
    }

    fn stale_or(&self, key: &str, error: Arc<E>) -> Result<Arc<V>, Arc<E>> {
        match (self.stale, self.get_stale(key)) {
            (StalePolicy::ServeStale, Some(stale)) => {
                debug!(key, "refresh failed, serving stale entry");
                Ok(stale)
            }
            _ => Err(error),
        }
    }
}

impl<V, E> TtlCache<V, E>
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Return the live entry for `key`, or run `compute` and cache its result.
    ///
    /// On failure the stale entry is served if the stale policy allows it,
    /// otherwise the error is returned. Callers that were waiting on the same
    /// fill get the same result without calling upstream themselves.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<V>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.get(key) {
            trace!(key, "cache hit");
            return Ok(value);
        }

        let flight = self.flight(key);
        let seen = flight.generation.load(Ordering::Acquire);
        let mut last_failure = flight.last_failure.clone().lock_owned().await;

        // Someone else may have filled the entry while we were queued.
        if let Some(value) = self.get(key) {
            trace!(key, "cache filled by concurrent request");
            return Ok(value);
        }
        if flight.generation.load(Ordering::Acquire) != seen
            && let Some(error) = last_failure.clone()
        {
            trace!(key, "joined a failed fill");
            return self.stale_or(key, error);
        }

        debug!(key, "cache miss, fetching");
        let fetch = compute();
        let cache = self.clone();
        let owned_key = key.to_owned();
        let fill = tokio::spawn(async move {
            let outcome = match fetch.await {
                Ok(value) => {
                    *last_failure = None;
                    Ok(cache.insert(owned_key, value, ttl))
                }
                Err(error) => {
                    let error = Arc::new(error);
                    *last_failure = Some(error.clone());
                    Err(error)
                }
            };
            flight.generation.fetch_add(1, Ordering::Release);
            drop(last_failure);
            outcome
        });

        match fill.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => self.stale_or(key, error),
            Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
            // Only happens while the runtime shuts down, which drops us too.
            Err(_) => std::future::pending().await,
        }
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but converts a failure
    /// into `fallback(error)`. The fallback value is returned without being
    /// cached.
    pub async fn get_or_else<F, Fut, D>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
        fallback: D,
    ) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        D: FnOnce(&E) -> V,
    {
        match self.get_or_compute(key, ttl, compute).await {
            Ok(value) => value,
            Err(error) => Arc::new(fallback(&error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const TTL: Duration = Duration::from_secs(60);

    #[derive(Debug, PartialEq)]
    struct Boom;

    type Cache<V> = TtlCache<V, Boom>;

    /// A fill that counts its calls, waits `delay` and then yields `result`.
    fn counted<V: Send + 'static>(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        result: Result<V, Boom>,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<V, Boom>> + Send>> + use<V> {
        let calls = calls.clone();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                result
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_skips_compute() {
        let cache = Cache::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let value = cache
                .get_or_compute("k", TTL, counted(&calls, Duration::ZERO, Ok(7)))
                .await
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched_once() {
        let cache = Cache::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_compute("k", TTL, counted(&calls, Duration::ZERO, Ok(0)));
        assert_eq!(*first.await.unwrap(), 0);
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        for _ in 0..2 {
            let again = cache.get_or_compute("k", TTL, counted(&calls, Duration::ZERO, Ok(1)));
            assert_eq!(*again.await.unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagates_error_without_entry() {
        let cache = Cache::<u32>::default();
        let result = cache
            .get_or_compute("k", TTL, || async { Err::<u32, _>(Boom) })
            .await;
        assert_eq!(*result.unwrap_err(), Boom);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn fallback_is_not_cached() {
        let cache = Cache::<Vec<u32>>::default();
        let value = cache
            .get_or_else("k", TTL, || async { Err::<Vec<u32>, _>(Boom) }, |_| Vec::new())
            .await;
        assert!(value.is_empty());
        assert!(cache.get_stale("k").is_none());

        let value = cache
            .get_or_else("k", TTL, || async { Ok::<_, Boom>(vec![1, 2]) }, |_| Vec::new())
            .await;
        assert_eq!(*value, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_value_served_when_refresh_fails() {
        let cache = Cache::<u32>::new(StalePolicy::ServeStale);
        cache.insert("k".into(), 3, TTL);
        tokio::time::advance(TTL * 2).await;

        let value = cache
            .get_or_compute("k", TTL, || async { Err::<u32, _>(Boom) })
            .await
            .unwrap();
        assert_eq!(*value, 3);
        // Still expired, so the next call goes upstream again.
        assert!(cache.get("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_policy_ignores_stale_value() {
        let cache = Cache::<u32>::new(StalePolicy::Discard);
        cache.insert("k".into(), 3, TTL);
        tokio::time::advance(TTL * 2).await;

        let value = cache
            .get_or_else("k", TTL, || async { Err::<u32, _>(Boom) }, |_| 0)
            .await;
        assert_eq!(*value, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let cache = Cache::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let fill = counted(&calls, Duration::from_millis(50), Ok(42));
                tokio::spawn(async move { cache.get_or_compute("k", TTL, fill).await.map(|v| *v) })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_share_a_failed_fill() {
        let cache = Cache::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                let fill = counted(&calls, Duration::from_secs(10), Err(Boom));
                tokio::spawn(async move { cache.get_or_compute("k", TTL, fill).await.map(|v| *v) })
            })
            .collect();

        for task in tasks {
            assert_eq!(*task.await.unwrap().unwrap_err(), Boom);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(20));

        // A lookup that starts after the failure tries again.
        let retry = cache.get_or_compute("k", TTL, counted(&calls, Duration::ZERO, Ok(5)));
        assert_eq!(*retry.await.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_on_a_failed_refresh_get_the_stale_value() {
        let cache = Cache::<u32>::new(StalePolicy::ServeStale);
        cache.insert("k".into(), 3, TTL);
        tokio::time::advance(TTL * 2).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let results = futures::future::join_all((0..5).map(|_| {
            cache.get_or_compute("k", TTL, counted(&calls, Duration::from_secs(1), Err(Boom)))
        }))
        .await;

        assert!(results.iter().all(|r| matches!(r, Ok(v) if **v == 3)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn started_fill_outlives_its_caller() {
        let cache = Cache::<u32>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let caller = cache.get_or_compute("k", TTL, counted(&calls, Duration::from_secs(5), Ok(9)));
        assert!(tokio::time::timeout(Duration::from_secs(1), caller).await.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cache.get("k").as_deref(), Some(&9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired_entries() {
        let cache = Cache::<u32>::default();
        cache.insert("short".into(), 1, Duration::from_secs(5));
        cache.insert("long".into(), 2, Duration::from_secs(500));
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = Cache::<u32>::default();
        cache.insert("k".into(), 1, TTL);
        assert!(cache.invalidate("k"));
        let value = cache
            .get_or_compute("k", TTL, || async { Ok::<_, Boom>(2) })
            .await
            .unwrap();
        assert_eq!(*value, 2);
    }
}
