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

//! The key → recency-list-node mapping. Kept as its own thin type, rather
//! than folded into [`crate::store::Store`] directly, so the
//! `index.len() == list.len()` invariant reads as a statement about two
//! named collaborators instead of an implicit property of one big struct.

use std::borrow::Borrow;
use std::hash::Hash;

use hashbrown::HashMap;

use crate::recency::Token;

pub(crate) struct KeyIndex<K> {
    map: HashMap<K, Token, ahash::RandomState>,
}

impl<K> KeyIndex<K>
where
    K: Eq + Hash,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, ahash::RandomState::default()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<Token>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).copied()
    }

    /// Registers `key -> token`. The caller is responsible for the
    /// one-to-one invariant with the recency list: a key must not already be
    /// present when this is called from `insert` (checked separately so
    /// `DuplicateKey` can be reported before any mutation happens).
    pub(crate) fn insert(&mut self, key: K, token: Token) {
        self.map.insert(key, token);
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<Token>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }
}
