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

use std::time::Instant;

/// The capability a cached value must expose so the cache can account for it
/// and dispose of it deterministically.
///
/// A payload is handed to the cache by [`Cache::insert`](crate::Cache::insert)
/// and the cache becomes the sole owner of it from that point on. `release` is
/// called exactly once, on whichever path eventually removes the entry
/// (explicit remove, eviction, expiry, `clear`, `dispose`, or `replace`).
/// Implementations must tolerate `release` being the last thing ever called
/// on a given clone of the payload; a cloned handle that outlives release
/// (e.g. one returned to a caller from `lookup` before the cache evicts it)
/// should itself observe the resource as gone, not silently keep working.
pub trait Payload: Clone + Send + Sync + 'static {
    /// Size of this payload in bytes, sampled once at insertion and never
    /// revised even if the underlying resource's size later changes.
    fn size(&self) -> u64;

    /// Release the external resource backing this payload. Safe to call
    /// exactly once; the cache never calls it twice for the same logical
    /// entry.
    fn release(&self);
}

/// An internal record wrapping a stored value together with its key, byte
/// size, and insertion timestamp.
///
/// `Entry` fields are never mutated after construction except by being
/// replaced wholesale (`replace`); recency promotion re-links the arena node
/// that owns the entry but never touches the entry itself.
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) size: u64,
    pub(crate) created_at: Instant,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, size: u64) -> Self {
        Self {
            key,
            value,
            size,
            created_at: Instant::now(),
        }
    }

    pub(crate) fn is_expired(&self, now: Instant, lifetime: std::time::Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= lifetime
    }
}
