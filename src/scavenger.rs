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

//! A dedicated background thread that fires a closure on a timer.
//!
//! Replaces the "timer callback" the original design relied on: a thread
//! that sleeps `period` between passes and checks a shutdown signal each
//! wake, rather than a library-managed timer that could in principle race
//! with disposal. Deliberately knows nothing about caches, keys, or
//! values — it is handed a closure and a schedule.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

struct Shutdown {
    lock: Mutex<bool>,
    cvar: Condvar,
}

/// A running timer thread. Dropping this without calling [`Scavenger::stop`]
/// detaches the thread rather than blocking; the thread keeps firing on
/// schedule until its closure tells it to stop (by returning `false`) or
/// `stop` is called explicitly.
pub(crate) struct Scavenger {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl Scavenger {
    /// Spawns the timer thread. `pass` fires first after `initial_delay`,
    /// then every `period`, until it returns `false` or [`stop`](Self::stop)
    /// is called.
    pub(crate) fn start<F>(period: Duration, initial_delay: Duration, mut pass: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let shutdown = Arc::new(Shutdown {
            lock: Mutex::new(false),
            cvar: Condvar::new(),
        });
        let worker_shutdown = shutdown.clone();

        let handle = thread::Builder::new()
            .name("keep-scavenger".to_owned())
            .spawn(move || {
                let mut guard = worker_shutdown.lock.lock();
                if !*guard {
                    worker_shutdown.cvar.wait_for(&mut guard, initial_delay);
                }
                loop {
                    if *guard {
                        return;
                    }
                    drop(guard);
                    if !pass() {
                        return;
                    }
                    guard = worker_shutdown.lock.lock();
                    if *guard {
                        return;
                    }
                    worker_shutdown.cvar.wait_for(&mut guard, period);
                }
            })
            .expect("failed to spawn cache scavenger thread");

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signals the thread to stop and blocks until it has exited.
    pub(crate) fn stop(mut self) {
        *self.shutdown.lock.lock() = true;
        self.shutdown.cvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn fires_on_schedule_and_stops() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticking = count.clone();
        let scavenger = Scavenger::start(Duration::from_millis(20), Duration::from_millis(1), move || {
            ticking.fetch_add(1, Ordering::SeqCst);
            true
        });
        thread::sleep(Duration::from_millis(90));
        scavenger.stop();
        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 2, "expected several ticks, got {fired}");
    }

    #[test]
    fn closure_returning_false_self_terminates() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticking = count.clone();
        let scavenger = Scavenger::start(Duration::from_millis(10), Duration::from_millis(1), move || {
            ticking.fetch_add(1, Ordering::SeqCst);
            false
        });
        thread::sleep(Duration::from_millis(60));
        let after_self_stop = count.load(Ordering::SeqCst);
        assert_eq!(after_self_stop, 1, "closure returning false should fire exactly once");
        scavenger.stop();
    }
}
