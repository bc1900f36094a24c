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

use thiserror::Error;

/// Errors produced by the cache's public operations.
///
/// A failed operation never has an observable effect on cache state: a
/// failed `insert` does not release the candidate payload, a failed
/// `replace` leaves the previous value in place, and so on.
#[derive(Debug, Error)]
pub enum Error {
    /// Any operation other than `dispose` itself, called after the cache has
    /// been disposed.
    #[error("cache has been disposed")]
    Disposed,

    /// `insert` was called with a key that is already present.
    #[error("key already present in cache")]
    DuplicateKey,

    /// `replace` (or an indexed read) was called with a key that is absent.
    #[error("key not present in cache")]
    AbsentKey,

    /// A budget or lock invariant was found to be violated. Not expected to
    /// be reachable; its presence indicates a defect in the cache itself
    /// rather than in the caller.
    #[error("internal cache invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
