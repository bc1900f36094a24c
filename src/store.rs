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

//! Wires the [`KeyIndex`] and [`RecencyList`] together behind the
//! cumulative-size budget. This is the engine; it knows nothing about
//! locking, disposal, or the scavenger's timer — [`crate::cache::Cache`]
//! owns all of that and calls in here only while already holding the write
//! lock.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::entry::{Entry, Payload};
use crate::index::KeyIndex;
use crate::recency::RecencyList;

pub(crate) struct Store<K, V> {
    index: KeyIndex<K>,
    list: RecencyList<K, V>,
    cumulative_size: u64,
    capacity: u64,
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Payload,
{
    pub(crate) fn new(capacity: u64, expected_element_count: usize) -> Self {
        Self {
            index: KeyIndex::with_capacity(expected_element_count),
            list: RecencyList::with_capacity(expected_element_count),
            cumulative_size: 0,
            capacity,
        }
    }

    pub(crate) fn count(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.list.len());
        self.index.len()
    }

    pub(crate) fn cumulative_size(&self) -> u64 {
        self.cumulative_size
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Looks up `key` and, on a hit, promotes its node to the front of the
    /// recency list. Returns a clone of the stored value.
    pub(crate) fn get_and_promote<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let token = self.index.get(key)?;
        self.list.move_to_front(token);
        self.list.peek(token).map(|entry| entry.value.clone())
    }

    /// Admits a new entry at the front, evicting from the tail first if
    /// needed to stay within `capacity`. Returns the number of entries
    /// evicted to make room. Assumes the caller already verified `key` is
    /// absent.
    pub(crate) fn insert(&mut self, key: K, value: V, deadline: Instant) -> u64 {
        let size = value.size();
        let evicted = if self.cumulative_size + size > self.capacity {
            self.evict_to_fit(size, deadline)
        } else {
            0
        };
        let entry = Entry::new(key.clone(), value, size);
        let token = self.list.push_front(entry);
        self.index.insert(key, token);
        self.cumulative_size += size;
        evicted
    }

    /// Removes `key`, releasing its payload. Returns whether it was present.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(token) = self.index.remove(key) else {
            return false;
        };
        if let Some(entry) = self.list.remove(token) {
            self.cumulative_size -= entry.size;
            entry.value.release();
        }
        true
    }

    /// Removes `key` only if its current value equals `value`, releasing
    /// the payload on a match.
    pub(crate) fn remove_pair<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        let Some(token) = self.index.get(key) else {
            return false;
        };
        let matches = self.list.peek(token).map(|entry| &entry.value == value).unwrap_or(false);
        if !matches {
            return false;
        }
        self.index.remove(key);
        if let Some(entry) = self.list.remove(token) {
            self.cumulative_size -= entry.size;
            entry.value.release();
        }
        true
    }

    /// Replaces the entry for `key` with a new value, releasing the
    /// displaced payload. Returns whether `key` was present; a miss leaves
    /// the store untouched.
    pub(crate) fn replace(&mut self, key: K, value: V) -> bool {
        let Some(token) = self.index.get(&key) else {
            return false;
        };
        if let Some(old) = self.list.remove(token) {
            self.cumulative_size -= old.size;
            old.value.release();
        }
        let size = value.size();
        let entry = Entry::new(key.clone(), value, size);
        let new_token = self.list.push_front(entry);
        self.index.insert(key, new_token);
        self.cumulative_size += size;
        true
    }

    /// Removes every entry, releasing every payload exactly once.
    pub(crate) fn clear(&mut self) {
        for entry in self.list.drain() {
            entry.value.release();
        }
        self.index.clear();
        self.cumulative_size = 0;
    }

    /// A snapshot of `(key, value)` pairs in recency order, front (most
    /// recent) first.
    pub(crate) fn enumerate(&self) -> Vec<(K, V)> {
        self.list
            .tokens_front_to_back()
            .into_iter()
            .filter_map(|token| self.list.peek(token).map(|entry| (entry.key.clone(), entry.value.clone())))
            .collect()
    }

    /// Walks the list from the back, unconditionally removing entries until
    /// admitting `incoming_size` more bytes would not exceed `capacity`, the
    /// list is exhausted, or `deadline` passes. Never skips a node based on
    /// expiry. Returns the number of entries removed.
    pub(crate) fn evict_to_fit(&mut self, incoming_size: u64, deadline: Instant) -> u64 {
        let mut removed = 0u64;
        for token in self.list.tokens_back_to_front() {
            if self.cumulative_size + incoming_size <= self.capacity {
                break;
            }
            if Instant::now() > deadline {
                break;
            }
            if let Some(entry) = self.list.remove(token) {
                self.index.remove(&entry.key);
                self.cumulative_size -= entry.size;
                entry.value.release();
                removed += 1;
            }
        }
        removed
    }

    /// Walks the list from the back, unconditionally removing entries until
    /// `cumulative_size` is at or below `capacity as f64 * threshold`, the
    /// list is exhausted, or `deadline` passes. Called by the periodic
    /// scavenge pass once the resident set's fill ratio crosses
    /// `cleanup_threshold`, independent of whether any entry has expired.
    pub(crate) fn shrink_to_threshold(&mut self, threshold: f64, deadline: Instant) -> u64 {
        let target = (self.capacity as f64 * threshold) as u64;
        let mut removed = 0u64;
        for token in self.list.tokens_back_to_front() {
            if self.cumulative_size <= target {
                break;
            }
            if Instant::now() > deadline {
                break;
            }
            if let Some(entry) = self.list.remove(token) {
                self.index.remove(&entry.key);
                self.cumulative_size -= entry.size;
                entry.value.release();
                removed += 1;
            }
        }
        removed
    }

    /// Walks the list from the back, removing every entry whose `lifetime`
    /// has elapsed as of `now`. Visits every node once, never stopping early
    /// just because a node wasn't expired, unless `deadline` passes first.
    pub(crate) fn expire(&mut self, now: Instant, lifetime: Duration, deadline: Instant) -> u64 {
        let mut removed = 0u64;
        for token in self.list.tokens_back_to_front() {
            if Instant::now() > deadline {
                break;
            }
            let expired = match self.list.peek(token) {
                Some(entry) => entry.is_expired(now, lifetime),
                None => continue,
            };
            if expired {
                if let Some(entry) = self.list.remove(token) {
                    self.index.remove(&entry.key);
                    self.cumulative_size -= entry.size;
                    entry.value.release();
                    removed += 1;
                }
            }
        }
        removed
    }
}
