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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use keep::{Cache, CacheConfig, Error, Payload};
use rand::prelude::SliceRandom;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Clone)]
struct Blob {
    size: u64,
    released: Arc<AtomicBool>,
}

impl Blob {
    fn new(size: u64) -> Self {
        Self {
            size,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A released blob must refuse further reads, independently of the
    /// cache's own removal bookkeeping.
    fn read(&self) -> Result<u64, &'static str> {
        if self.released.load(Ordering::SeqCst) {
            Err("blob resource already released")
        } else {
            Ok(self.size)
        }
    }
}

impl Payload for Blob {
    fn size(&self) -> u64 {
        self.size
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

fn never_scavenges(capacity: u64) -> CacheConfig {
    CacheConfig::builder(capacity, Duration::from_secs(2000), 0.8)
        .with_initial_scavenge_delay(Duration::from_secs(2000))
        .build()
}

#[test_log::test]
fn basic_round_trip() {
    let cache: Cache<u32, Blob> = Cache::new(
        CacheConfig::builder(1000, Duration::from_secs(100), 0.8)
            .with_element_lifetime(Duration::from_secs(1))
            .with_initial_scavenge_delay(Duration::from_secs(2000))
            .build(),
    );

    cache.insert(1, Blob::new(100)).unwrap();

    assert_eq!(cache.lookup(&1).unwrap().unwrap().size(), 100);
    assert_eq!(cache.count(), 1);
    assert_eq!(cache.current_size(), 100);

    cache.dispose();
}

/// Inserting past capacity evicts from the least-recently-used end so only
/// the most recent entries survive.
#[test_log::test]
fn capacity_driven_eviction() {
    let cache: Cache<u32, Blob> = Cache::new(
        CacheConfig::builder(5, Duration::from_secs(100), 0.8)
            .with_element_lifetime(Duration::from_secs(100))
            .with_initial_scavenge_delay(Duration::from_secs(2000))
            .build(),
    );

    for k in 0..6u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }

    assert_eq!(cache.count(), 5);
    assert!(cache.lookup(&0).unwrap().is_none());
    for k in 1..6u32 {
        assert!(cache.lookup(&k).unwrap().is_some(), "key {k} should have survived eviction");
    }

    cache.dispose();
}

/// A sequence of distinct lookups reorders enumeration to mirror access
/// order, most-recently-looked-up first.
#[test_log::test]
fn recency_ordering_under_random_access() {
    let cache: Cache<u32, Blob> = Cache::new(never_scavenges(1000));

    for k in 0..1000u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }

    let mut order: Vec<u32> = (0..1000u32).collect();
    order.shuffle(&mut SmallRng::seed_from_u64(7));
    let accesses = order.into_iter().take(500).collect_vec();

    for &k in &accesses {
        cache.lookup(&k).unwrap();
    }

    let expected_front: Vec<u32> = accesses.iter().rev().copied().collect();
    let enumerated = cache.keys().unwrap();
    assert_eq!(&enumerated[..500], &expected_front[..]);

    cache.dispose();
}

/// The background scavenger, left to run on its own schedule, clears out an
/// entire cache-load of entries once they all age past their lifetime.
#[test_log::test]
fn timer_driven_expiry() {
    let config = CacheConfig::builder(1000, Duration::from_secs(1), 0.8)
        .with_element_lifetime(Duration::from_millis(1))
        .with_initial_scavenge_delay(Duration::from_millis(100))
        .build();
    let cache: Cache<u32, Blob> = Cache::new(config);

    for k in 0..1000u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }

    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(cache.count(), 0);

    cache.dispose();
}

/// When two batches are inserted with a gap between them, a scavenger pass
/// landing between their expirations removes only the older batch.
#[test_log::test]
fn partial_expiry_keeps_the_later_batch() {
    let config = CacheConfig::builder(1000, Duration::from_millis(50), 0.8)
        .with_element_lifetime(Duration::from_millis(500))
        .with_initial_scavenge_delay(Duration::from_millis(50))
        .build();
    let cache: Cache<u32, Blob> = Cache::new(config);

    for k in 0..10u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }
    std::thread::sleep(Duration::from_millis(200));
    for k in 10..30u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }
    std::thread::sleep(Duration::from_millis(400));

    assert_eq!(cache.count(), 20);
    for k in 0..10u32 {
        assert!(cache.lookup(&k).unwrap().is_none(), "key {k} from the first batch should have expired");
    }
    for k in 10..30u32 {
        assert!(cache.lookup(&k).unwrap().is_some(), "key {k} from the second batch should have survived");
    }

    cache.dispose();
}

#[test_log::test]
fn concurrent_inserts_all_land() {
    let cache: Cache<u32, Blob> = Cache::new(never_scavenges(1000));

    std::thread::scope(|scope| {
        for k in 0..1000u32 {
            let cache = cache.clone();
            scope.spawn(move || {
                cache.insert(k, Blob::new(1)).unwrap();
            });
        }
    });

    for k in 0..1000u32 {
        assert!(cache.lookup(&k).unwrap().is_some(), "key {k} should be retrievable");
    }

    cache.dispose();
}

#[test_log::test]
fn concurrent_removes_leave_exactly_the_odd_keys() {
    let cache: Cache<u32, Blob> = Cache::new(never_scavenges(1000));

    for k in 0..1000u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }

    std::thread::scope(|scope| {
        for k in (0..1000u32).step_by(2) {
            let cache = cache.clone();
            scope.spawn(move || {
                assert!(cache.remove(&k).unwrap());
            });
        }
    });

    assert_eq!(cache.count(), 500);
    for k in 0..1000u32 {
        assert_eq!(cache.lookup(&k).unwrap().is_some(), k % 2 == 1, "key {k} parity mismatch");
    }

    cache.dispose();
}

#[test_log::test]
fn dispose_during_active_use() {
    let cache: Cache<u32, Blob> = Cache::new(never_scavenges(1000));

    for k in 0..200u32 {
        cache.insert(k, Blob::new(1)).unwrap();
    }

    cache.dispose();

    assert_eq!(cache.current_size(), 0);
    assert_eq!(cache.count(), 0);
    assert!(matches!(cache.insert(9999, Blob::new(1)), Err(Error::Disposed)));

    // second dispose is a no-op
    cache.dispose();
}

/// Removing a key releases its payload exactly once, and the payload itself
/// (not the cache) reports the resource as gone afterwards.
#[test_log::test]
fn eviction_releases_resources_exactly_once() {
    let cache: Cache<u32, Blob> = Cache::new(never_scavenges(1000));

    let blob = Blob::new(10);
    let handle = blob.clone();
    cache.insert(1, blob).unwrap();

    assert!(cache.remove(&1).unwrap());
    assert!(!cache.remove(&1).unwrap(), "second remove is idempotently false");

    assert!(handle.read().is_err(), "released blob must refuse further reads");
}

/// Every payload ever inserted is released exactly once by the time the
/// cache is disposed, even under a mix of eviction, explicit removal, and
/// disposal.
#[test_log::test]
fn every_payload_released_exactly_once_overall() {
    let released_count = Arc::new(AtomicUsize::new(0));

    #[derive(Clone)]
    struct Counted {
        size: u64,
        fired: Arc<AtomicBool>,
        counter: Arc<AtomicUsize>,
    }

    impl Payload for Counted {
        fn size(&self) -> u64 {
            self.size
        }

        fn release(&self) {
            if !self.fired.swap(true, Ordering::SeqCst) {
                self.counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    let cache: Cache<u32, Counted> = Cache::new(
        CacheConfig::builder(10, Duration::from_secs(100), 0.8)
            .with_initial_scavenge_delay(Duration::from_secs(2000))
            .build(),
    );

    for k in 0..20u32 {
        cache
            .insert(
                k,
                Counted {
                    size: 1,
                    fired: Arc::new(AtomicBool::new(false)),
                    counter: released_count.clone(),
                },
            )
            .unwrap();
    }
    // half of these were evicted on admission; explicitly remove a few survivors.
    cache.remove(&15).unwrap();
    cache.remove(&16).unwrap();

    cache.dispose();

    assert_eq!(released_count.load(Ordering::SeqCst), 20, "every inserted payload releases exactly once");
}
