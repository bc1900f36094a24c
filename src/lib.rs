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

//! `keep` is an in-process, concurrent, size-bounded LRU cache specialized
//! for entries that own heavyweight external resources — open file handles,
//! memory-mapped buffers, network-sourced byte streams. Its intended client
//! is a long-lived service that serves large binary payloads to remote
//! callers and wants to avoid re-fetching or re-materializing them.
//!
//! The cache is built from five cooperating pieces, each its own module:
//!
//! - [`entry`]: the [`entry::Payload`] capability (`size` + `release`) and
//!   the internal record that pairs a payload with its key, size, and
//!   insertion time.
//! - [`recency`]: an arena-backed doubly-linked recency ordering, most
//!   recent at the front.
//! - [`index`]: the key → recency-list-node map.
//! - [`store`]: wires the two together behind the cumulative-size budget —
//!   the engine, oblivious to locking.
//! - [`scavenger`]: the background timer thread that periodically expires
//!   aged entries.
//! - [`cache`]: the public [`Cache`] facade, which owns the lock, the
//!   scavenger, and the disposed flag.
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use keep::{Cache, CacheConfig, Payload};
//!
//! #[derive(Clone)]
//! struct Blob {
//!     bytes: usize,
//!     released: Arc<AtomicBool>,
//! }
//!
//! impl Payload for Blob {
//!     fn size(&self) -> u64 {
//!         self.bytes as u64
//!     }
//!
//!     fn release(&self) {
//!         self.released.store(true, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = CacheConfig::builder(1024, Duration::from_secs(60), 0.8).build();
//! let cache: Cache<String, Blob> = Cache::new(config);
//!
//! let released = Arc::new(AtomicBool::new(false));
//! cache
//!     .insert("a".to_owned(), Blob { bytes: 128, released: released.clone() })
//!     .unwrap();
//! assert_eq!(cache.lookup("a").unwrap().unwrap().bytes, 128);
//!
//! cache.remove("a").unwrap();
//! assert!(released.load(Ordering::SeqCst));
//!
//! cache.dispose();
//! ```

mod cache;
mod config;
mod entry;
mod error;
mod index;
mod metrics;
mod recency;
mod scavenger;
mod store;

pub use cache::Cache;
pub use config::{clamp_millis, CacheBuilder, CacheConfig};
pub use entry::Payload;
pub use error::{Error, Result};
pub use metrics::CacheStats;
