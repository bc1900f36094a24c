//  Copyright 2024 Foyer Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! The public cache facade.
//!
//! A single [`parking_lot::RwLock`] protects the recency list, key index,
//! and cumulative size (all inside [`Store`]). `lookup` promotes a node on
//! every hit, which is a write to the list even though nothing semantically
//! "writes" the cache — so `lookup` takes the write lock for its whole
//! duration rather than racing a read-mode promotion in, which is the
//! simplest correct choice short of a lock-free move-to-front. `insert`
//! takes the upgradable-read mode to check for a duplicate key cheaply, then
//! upgrades to write only once it knows it actually has to mutate.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::config::CacheConfig;
use crate::entry::Payload;
use crate::error::{Error, Result};
use crate::metrics::{CacheStats, Metrics};
use crate::scavenger::Scavenger;
use crate::store::Store;

struct Inner<K, V> {
    store: RwLock<Store<K, V>>,
    config: CacheConfig,
    disposed: AtomicBool,
    /// Ensures at most one scavenge pass runs at a time. Both the timer pass
    /// and an insertion-driven eviction pass already run under the write
    /// lock, which alone serializes them; this flag exists so that
    /// invariant is explicit and observable rather than incidental.
    scavenging: AtomicBool,
    metrics: Metrics,
    scavenger: Mutex<Option<Scavenger>>,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Payload,
{
    fn run_scavenge_pass(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if self.scavenging.swap(true, Ordering::AcqRel) {
            tracing::trace!("scavenge pass skipped; another pass is already in progress");
            return;
        }
        let start = Instant::now();
        let deadline = start + self.config.scavenge_time_bound;

        let mut store = self.store.write();
        let expired = if self.config.items_have_expiration_dates {
            store.expire(start, self.config.element_lifetime, deadline)
        } else {
            0
        };
        let capacity = store.capacity();
        let fill = if capacity == 0 {
            0.0
        } else {
            store.cumulative_size() as f64 / capacity as f64
        };
        let shrunk = if fill > self.config.cleanup_threshold {
            store.shrink_to_threshold(self.config.cleanup_threshold, deadline)
        } else {
            0
        };
        drop(store);

        self.scavenging.store(false, Ordering::Release);
        self.metrics.record_expire(expired);
        self.metrics.record_evict(shrunk);
        tracing::debug!(
            expired,
            shrunk,
            elapsed_ms = start.elapsed().as_millis() as u64,
            timed_out = Instant::now() > deadline,
            "scavenge pass complete"
        );
    }
}

/// A concurrent, size-bounded LRU cache of entries that own heavyweight
/// external resources.
///
/// `Cache` is a thin, cheaply-`Clone`-able handle onto shared state (like an
/// `Arc`); clone it to hand it to another thread rather than wrapping it in
/// one yourself.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Payload,
{
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Payload,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Payload,
{
    /// Builds a cache from `config`, starting its background scavenger
    /// immediately (first fire after `initial_scavenge_delay`).
    pub fn new(config: CacheConfig) -> Self {
        let period = config.scavenge_period;
        let initial_delay = config.initial_scavenge_delay;
        let expected_element_count = config.expected_element_count;
        let capacity = config.capacity;

        let inner = Arc::new(Inner {
            store: RwLock::new(Store::new(capacity, expected_element_count)),
            config,
            disposed: AtomicBool::new(false),
            scavenging: AtomicBool::new(false),
            metrics: Metrics::default(),
            scavenger: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let scavenger = Scavenger::start(period, initial_delay, move || match weak.upgrade() {
            Some(inner) => {
                inner.run_scavenge_pass();
                true
            }
            // Every external handle was dropped without calling `dispose`;
            // let the thread wind itself down instead of running forever.
            None => false,
        });
        *inner.scavenger.lock() = Some(scavenger);

        tracing::debug!(capacity, "cache constructed");
        Self { inner }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.inner.disposed.load(Ordering::Acquire) {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    /// Inserts `value` under `key`. Fails with [`Error::DuplicateKey`] if the
    /// key is already present, or [`Error::Disposed`] if the cache has been
    /// disposed. If admitting the entry would push the cumulative size above
    /// capacity, evicts from the least-recently-used end first.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.ensure_live()?;
        let upgradable = self.inner.store.upgradable_read();
        if upgradable.contains_key(&key) {
            return Err(Error::DuplicateKey);
        }
        let mut write = upgradable.upgrade();
        let deadline = Instant::now() + self.inner.config.scavenge_time_bound;
        let evicted = write.insert(key, value, deadline);
        drop(write);
        self.inner.metrics.record_insert();
        self.inner.metrics.record_evict(evicted);
        Ok(())
    }

    /// Looks up `key`, promoting it to the front of the recency order on a
    /// hit. The promotion is a write, so this takes the write lock.
    pub fn lookup<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ensure_live()?;
        let hit = self.inner.store.write().get_and_promote(key);
        if hit.is_some() {
            self.inner.metrics.record_hit();
        } else {
            self.inner.metrics.record_miss();
        }
        Ok(hit)
    }

    /// Equivalent to `lookup(key).is_some()`. Promotes on a hit, the same
    /// observable side effect as `lookup` — documented here because it is
    /// easy to assume a pure containment check doesn't reorder anything.
    pub fn contains<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Ok(self.lookup(key)?.is_some())
    }

    /// Removes `key`, releasing its payload. Returns whether it was present;
    /// calling this twice in a row for the same key returns `true` then
    /// `false`.
    pub fn remove<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ensure_live()?;
        Ok(self.inner.store.write().remove(key))
    }

    /// Removes `key` only if its current value equals `value`.
    pub fn remove_pair<Q>(&self, key: &Q, value: &V) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        self.ensure_live()?;
        Ok(self.inner.store.write().remove_pair(key, value))
    }

    /// Replaces the value stored for `key`, releasing the displaced
    /// payload. Fails with [`Error::AbsentKey`] if `key` is not present —
    /// unlike `insert`, which requires the key be absent, `replace` requires
    /// it be present.
    pub fn replace(&self, key: K, value: V) -> Result<()> {
        self.ensure_live()?;
        if self.inner.store.write().replace(key, value) {
            self.inner.metrics.record_replace();
            Ok(())
        } else {
            Err(Error::AbsentKey)
        }
    }

    /// Removes every entry, releasing every payload exactly once.
    pub fn clear(&self) -> Result<()> {
        self.ensure_live()?;
        self.inner.store.write().clear();
        Ok(())
    }

    /// Stops the scavenger, releases every resident payload, and marks the
    /// cache disposed. Idempotent: a second call is a no-op. Every
    /// operation other than `dispose` itself fails with [`Error::Disposed`]
    /// afterwards.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("disposing cache");
        if let Some(scavenger) = self.inner.scavenger.lock().take() {
            scavenger.stop();
        }
        self.inner.store.write().clear();
    }

    /// A snapshot of `(key, value)` pairs in recency order, most recently
    /// used first.
    pub fn enumerate(&self) -> Result<Vec<(K, V)>> {
        self.ensure_live()?;
        Ok(self.inner.store.read().enumerate())
    }

    /// Keys in recency order, most recently used first.
    pub fn keys(&self) -> Result<Vec<K>> {
        Ok(self.enumerate()?.into_iter().map(|(k, _)| k).collect())
    }

    /// Values in recency order, most recently used first.
    pub fn values(&self) -> Result<Vec<V>> {
        Ok(self.enumerate()?.into_iter().map(|(_, v)| v).collect())
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.inner.store.read().count()
    }

    /// Sum of `size()` across all live entries.
    pub fn current_size(&self) -> u64 {
        self.inner.store.read().cumulative_size()
    }

    /// The byte budget this cache was constructed with.
    pub fn capacity(&self) -> u64 {
        self.inner.config.capacity
    }

    /// A snapshot of this cache's hit/miss/insert/evict/expire counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.metrics.snapshot()
    }
}

impl<K, V> Drop for Inner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Payload,
{
    /// A safety net for callers who drop every `Cache` handle without ever
    /// calling `dispose`: still releases every resident payload exactly
    /// once. Does not join the scavenger thread — that would block a `Drop`
    /// on a sleeping background thread — it instead relies on the thread's
    /// own `Weak` upgrade failing on its next wake to let it exit.
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::Release);
        self.store.write().clear();
    }
}
