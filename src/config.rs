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

use std::time::Duration;

/// Durations beyond this, expressed in milliseconds, are what a negative
/// millisecond count clamps to — i.e. "never", within the positive range of
/// a 32-bit millisecond counter.
const NEVER_MILLIS: u64 = u32::MAX as u64;

/// Maps a raw millisecond count onto a non-negative 32-bit millisecond
/// range, the way a config value migrated from a millisecond-based source
/// would be interpreted: negative counts mean "never" and clamp to the
/// maximum.
///
/// Rust's own `Duration`-typed builder setters can't carry a negative value
/// in the first place, so callers that already have a `Duration` in hand
/// don't need this; it exists for bridging raw millisecond inputs (e.g. read
/// out of an external config file) into the builder.
pub fn clamp_millis(millis: i64) -> Duration {
    if millis < 0 {
        Duration::from_millis(NEVER_MILLIS)
    } else {
        Duration::from_millis((millis as u64).min(NEVER_MILLIS))
    }
}

/// Construction parameters for [`Cache`](crate::Cache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub(crate) capacity: u64,
    pub(crate) scavenge_period: Duration,
    pub(crate) cleanup_threshold: f64,
    pub(crate) scavenge_time_bound: Duration,
    pub(crate) initial_scavenge_delay: Duration,
    pub(crate) expected_element_count: usize,
    pub(crate) element_lifetime: Duration,
    pub(crate) items_have_expiration_dates: bool,
}

impl CacheConfig {
    /// Starts a builder for a cache with the given byte `capacity` and
    /// `scavenge_period`. `cleanup_threshold` is the fractional fill ratio,
    /// in `(0, 1]`, above which a scavenge pass should eagerly shrink the
    /// resident set.
    pub fn builder(capacity: u64, scavenge_period: Duration, cleanup_threshold: f64) -> CacheBuilder {
        assert!(
            cleanup_threshold > 0.0 && cleanup_threshold <= 1.0,
            "cleanup_threshold must be in (0, 1], got {cleanup_threshold}"
        );
        CacheBuilder {
            capacity,
            scavenge_period,
            cleanup_threshold,
            scavenge_time_bound: Duration::from_millis(300),
            initial_scavenge_delay: Duration::from_secs(20),
            expected_element_count: 100,
            element_lifetime: Duration::from_secs(3600),
            items_have_expiration_dates: true,
        }
    }
}

/// Builder for [`CacheConfig`], carrying the documented defaults from the
/// library surface: `scavenge_time_bound = 300ms`, `initial_scavenge_delay =
/// 20s`, `expected_element_count = 100`, `element_lifetime = 1h`,
/// `items_have_expiration_dates = true`.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: u64,
    scavenge_period: Duration,
    cleanup_threshold: f64,
    scavenge_time_bound: Duration,
    initial_scavenge_delay: Duration,
    expected_element_count: usize,
    element_lifetime: Duration,
    items_have_expiration_dates: bool,
}

impl CacheBuilder {
    pub fn with_scavenge_time_bound(mut self, bound: Duration) -> Self {
        self.scavenge_time_bound = bound;
        self
    }

    pub fn with_initial_scavenge_delay(mut self, delay: Duration) -> Self {
        self.initial_scavenge_delay = delay;
        self
    }

    pub fn with_expected_element_count(mut self, count: usize) -> Self {
        self.expected_element_count = count;
        self
    }

    pub fn with_element_lifetime(mut self, lifetime: Duration) -> Self {
        self.element_lifetime = lifetime;
        self
    }

    pub fn with_items_have_expiration_dates(mut self, enabled: bool) -> Self {
        self.items_have_expiration_dates = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            capacity: self.capacity,
            scavenge_period: self.scavenge_period,
            cleanup_threshold: self.cleanup_threshold,
            scavenge_time_bound: self.scavenge_time_bound,
            initial_scavenge_delay: self.initial_scavenge_delay,
            expected_element_count: self.expected_element_count,
            element_lifetime: self.element_lifetime,
            items_have_expiration_dates: self.items_have_expiration_dates,
        }
    }
}
