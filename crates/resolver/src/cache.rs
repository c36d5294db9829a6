//! Bounded corpus cache with per-key population locks.
//!
//! Lookups take the LRU mutex only long enough to clone an `Arc`. A miss
//! takes the key's async gate, re-checks, and only then calls the loader, so
//! concurrent requests for one key share a single external call and never
//! observe a half-built corpus. Failed loads are not cached. The gate leaves
//! the map when its holder finishes, including when the load is cancelled.
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use corpus::Corpus;
use dashmap::DashMap;
use lru::LruCache;
use serde::Serialize;

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

pub(crate) struct CorpusCache<K> {
    entries: Mutex<LruCache<K, Arc<Corpus>>>,
    gates: DashMap<K, Gate>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K> CorpusCache<K>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            gates: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Arc<Corpus>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &K) -> Option<Arc<Corpus>> {
        self.lock().get(key).cloned()
    }

    /// Cached corpus for `key`, loading it at most once across concurrent callers.
    ///
    /// The flag is `true` when the value came from the cache.
    pub(crate) async fn get_or_load<F, Fut, E>(
        &self,
        key: &K,
        load: F,
    ) -> Result<(Arc<Corpus>, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Corpus, E>>,
    {
        if let Some(hit) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((hit, true));
        }

        let gate = self
            .gates
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();

        let _populating = gate.lock().await;
        // Dropped before `_populating`: callers already queued on this gate
        // re-check the cache, later callers start from a fresh gate.
        let _release = GateRelease {
            gates: &self.gates,
            key,
            gate: Arc::clone(&gate),
        };
        match self.lookup(key) {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok((hit, true))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                load().await.map(|corpus| {
                    let corpus = Arc::new(corpus);
                    self.lock().put(key.clone(), Arc::clone(&corpus));
                    (corpus, false)
                })
            }
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

/// Removes the key's gate on drop unless a newer gate replaced it.
struct GateRelease<'a, K: Hash + Eq> {
    gates: &'a DashMap<K, Gate>,
    key: &'a K,
    gate: Gate,
}

impl<K: Hash + Eq> Drop for GateRelease<'_, K> {
    fn drop(&mut self) {
        self.gates
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, &self.gate));
    }
}
