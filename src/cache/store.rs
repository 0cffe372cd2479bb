//! Tag-scoped cache storage.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::Instant;

use lru::LruCache;
use metrics::counter;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::{CacheTag, ListKey};

struct Entry {
    body: String,
    tag: CacheTag,
    expires_at: Instant,
}

struct Inner {
    entries: LruCache<String, Entry>,
    /// Tag → keys index; invalidation drains a tag's set and pops each key.
    tagged: HashMap<CacheTag, HashSet<String>>,
}

/// Expiring key-value cache over serialized list bodies, with bulk
/// invalidation by tag.
///
/// Concurrent misses for the same key may each compute; recomputation is
/// idempotent and the last store wins. What must hold instead: once
/// `invalidate_tag` returns, no later lookup observes a body computed from
/// pre-invalidation state. A per-tag generation counter enforces that —
/// a computed body is only stored if its tag's generation did not move
/// while the computation ran.
pub struct ResponseCache {
    config: CacheConfig,
    inner: RwLock<Inner>,
    generations: [AtomicU64; CacheTag::COUNT],
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = LruCache::new(config.list_entry_limit_non_zero());
        Self {
            config,
            inner: RwLock::new(Inner {
                entries,
                tagged: HashMap::new(),
            }),
            generations: [AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Return the cached body for `key` if present and unexpired; otherwise
    /// run `compute`, store its result under `key` tagged `tag`, and return
    /// it. Only `compute` can fail — the cache itself never produces an
    /// error, and a disabled cache is a plain pass-through.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &ListKey,
        tag: CacheTag,
        compute: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if !self.config.enabled {
            return compute().await;
        }

        let rendered = key.render();
        if let Some(body) = self.lookup(&rendered) {
            counter!("libris_cache_list_hit_total").increment(1);
            return Ok(body);
        }
        counter!("libris_cache_list_miss_total").increment(1);

        let generation = self.generation(tag);
        let body = compute().await?;
        self.store_if_current(rendered, tag, generation, body.clone());
        Ok(body)
    }

    /// Remove every entry carrying `tag`, expired or not. Synchronous: when
    /// this returns, any subsequent lookup under the tag misses.
    pub fn invalidate_tag(&self, tag: CacheTag) {
        self.generations[tag.index()].fetch_add(1, Ordering::SeqCst);
        if !self.config.enabled {
            return;
        }

        let mut inner = self.write_inner("invalidate_tag");
        let keys = inner.tagged.remove(&tag).unwrap_or_default();
        let removed = keys.len();
        for key in &keys {
            inner.entries.pop(key);
        }
        drop(inner);

        counter!("libris_cache_list_invalidated_total").increment(removed as u64);
        debug!(
            tag = tag.as_str(),
            entries = removed,
            "cache tag invalidated"
        );
    }

    pub fn len(&self) -> usize {
        self.write_inner("len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn generation(&self, tag: CacheTag) -> u64 {
        self.generations[tag.index()].load(Ordering::SeqCst)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let mut inner = self.write_inner("lookup");
        let expired = match inner.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.body.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Drop the entry and its tag index row eagerly.
            if let Some(entry) = inner.entries.pop(key) {
                if let Some(keys) = inner.tagged.get_mut(&entry.tag) {
                    keys.remove(key);
                }
            }
            counter!("libris_cache_list_expired_total").increment(1);
        }
        None
    }

    fn store_if_current(&self, key: String, tag: CacheTag, generation: u64, body: String) {
        let entry = Entry {
            body,
            tag,
            expires_at: Instant::now() + self.config.list_ttl(),
        };

        let mut inner = self.write_inner("store");
        // Checked under the lock: an invalidation that bumps the generation
        // after this point blocks on the same lock and will remove whatever
        // gets pushed below. A body computed before the bump must not be
        // stored — it could resurrect pre-write state.
        if self.generation(tag) != generation {
            debug!(
                tag = tag.as_str(),
                key = %key,
                "discarding cache fill computed before tag invalidation"
            );
            return;
        }

        if let Some((evicted_key, evicted)) = inner.entries.push(key.clone(), entry) {
            if evicted_key != key {
                if let Some(keys) = inner.tagged.get_mut(&evicted.tag) {
                    keys.remove(&evicted_key);
                }
                counter!("libris_cache_list_evicted_total").increment(1);
            }
        }
        inner.tagged.entry(tag).or_default().insert(key);
    }

    fn write_inner(&self, op: &'static str) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    lock_kind = "rwlock.write",
                    result = "poisoned_recovered",
                    "Recovered from poisoned cache lock"
                );
                poisoned.into_inner()
            }
        }
    }
}
