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

use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters, mirrored out through the `metrics` crate's global
/// recorder for whatever exporter the host process installs (Prometheus,
/// StatsD, ...). Both sides are cheap when nobody is reading them: the
/// atomics are relaxed, and `metrics`'s macros are no-ops without a recorder
/// installed.
#[derive(Default)]
pub(crate) struct Metrics {
    hit: AtomicU64,
    miss: AtomicU64,
    insert: AtomicU64,
    replace: AtomicU64,
    evict: AtomicU64,
    expire: AtomicU64,
}

impl Metrics {
    pub(crate) fn record_hit(&self) {
        self.hit.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("keep_hit_total").increment(1);
    }

    pub(crate) fn record_miss(&self) {
        self.miss.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("keep_miss_total").increment(1);
    }

    pub(crate) fn record_insert(&self) {
        self.insert.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("keep_insert_total").increment(1);
    }

    pub(crate) fn record_replace(&self) {
        self.replace.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("keep_replace_total").increment(1);
    }

    pub(crate) fn record_evict(&self, count: u64) {
        if count > 0 {
            self.evict.fetch_add(count, Ordering::Relaxed);
            metrics::counter!("keep_evict_total").increment(count);
        }
    }

    pub(crate) fn record_expire(&self, count: u64) {
        if count > 0 {
            self.expire.fetch_add(count, Ordering::Relaxed);
            metrics::counter!("keep_expire_total").increment(count);
        }
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hit: self.hit.load(Ordering::Relaxed),
            miss: self.miss.load(Ordering::Relaxed),
            insert: self.insert.load(Ordering::Relaxed),
            replace: self.replace.load(Ordering::Relaxed),
            evict: self.evict.load(Ordering::Relaxed),
            expire: self.expire.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of a cache's activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hit: u64,
    pub miss: u64,
    pub insert: u64,
    pub replace: u64,
    pub evict: u64,
    pub expire: u64,
}
