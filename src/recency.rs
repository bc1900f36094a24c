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

//! A doubly-linked recency ordering over [`Entry`] values.
//!
//! Nodes live in a single contiguous `Vec`, addressed by their position
//! (an arena), rather than behind individually-allocated, individually-freed
//! pointers. Removed slots go onto a free list and are reused by the next
//! push, so the arena never needs compaction. This sidesteps the aliasing
//! hazard of juggling raw pointers into a structure that's also being
//! mutated by eviction and expiry (see the cache's module docs): every
//! handle into the list is a `Token`, a plain `(index, generation)` pair
//! checked against the slot it names before use.
//!
//! Front = most-recently-used. Back = least-recently-used / next to evict.

use crate::entry::Entry;

/// A stable handle to a node in a [`RecencyList`]. Cheap to copy, cheap to
/// stash in the key index; a `Token` that outlives its node's removal is
/// simply rejected by the generation check rather than aliasing a
/// reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    index: usize,
    generation: u64,
}

struct Slot<K, V> {
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
    generation: u64,
}

pub(crate) struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    /// Index of the most-recently-used node, if the list is non-empty.
    head: Option<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links `idx` in at the front of the list. `idx` must already hold a
    /// live entry and must not currently be linked.
    fn link_front(&mut self, idx: usize) {
        match self.head {
            Some(head) => {
                let tail = self.slots[head].prev;
                self.slots[idx].prev = tail;
                self.slots[idx].next = head;
                self.slots[tail].next = idx;
                self.slots[head].prev = idx;
            }
            None => {
                self.slots[idx].prev = idx;
                self.slots[idx].next = idx;
            }
        }
        self.head = Some(idx);
    }

    /// Removes `idx` from the ring without touching its entry or generation.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev == idx {
            // sole remaining node
            self.head = None;
        } else {
            self.slots[prev].next = next;
            self.slots[next].prev = prev;
            if self.head == Some(idx) {
                self.head = Some(next);
            }
        }
    }

    /// Pushes a new entry to the front of the list, returning its token.
    pub(crate) fn push_front(&mut self, entry: Entry<K, V>) -> Token {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(Slot {
                    entry: None,
                    prev: 0,
                    next: 0,
                    generation: 0,
                });
                self.slots.len() - 1
            }
        };
        self.slots[idx].entry = Some(entry);
        self.link_front(idx);
        self.len += 1;
        Token {
            index: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn valid(&self, token: Token) -> bool {
        self.slots
            .get(token.index)
            .map(|slot| slot.generation == token.generation && slot.entry.is_some())
            .unwrap_or(false)
    }

    /// Moves the node named by `token` to the front of the list. Returns
    /// `false` if the token is stale (already removed).
    pub(crate) fn move_to_front(&mut self, token: Token) -> bool {
        if !self.valid(token) {
            return false;
        }
        if self.head != Some(token.index) {
            self.unlink(token.index);
            self.link_front(token.index);
        }
        true
    }

    /// Returns a reference to the entry named by `token`, if still live.
    pub(crate) fn peek(&self, token: Token) -> Option<&Entry<K, V>> {
        if !self.valid(token) {
            return None;
        }
        self.slots[token.index].entry.as_ref()
    }

    /// Removes and returns the entry named by `token`. Returns `None` if the
    /// token is stale.
    pub(crate) fn remove(&mut self, token: Token) -> Option<Entry<K, V>> {
        if !self.valid(token) {
            return None;
        }
        self.unlink(token.index);
        let slot = &mut self.slots[token.index];
        let entry = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(token.index);
        self.len -= 1;
        entry
    }

    /// Removes every entry, returning them in front-to-back order. The list
    /// is empty afterwards but retains its backing storage.
    pub(crate) fn drain(&mut self) -> Vec<Entry<K, V>> {
        let tokens = self.tokens_front_to_back();
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(entry) = self.remove(token) {
                out.push(entry);
            }
        }
        out
    }

    /// Snapshots the current tokens ordered least-recently-used first (the
    /// direction the scavenger and inline eviction walk in).
    pub(crate) fn tokens_back_to_front(&self) -> Vec<Token> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(head) = self.head {
            let mut idx = self.slots[head].prev; // tail
            for _ in 0..self.len {
                out.push(Token {
                    index: idx,
                    generation: self.slots[idx].generation,
                });
                idx = self.slots[idx].prev;
            }
        }
        out
    }

    /// Snapshots the current tokens ordered most-recently-used first (the
    /// order `enumerate` yields).
    pub(crate) fn tokens_front_to_back(&self) -> Vec<Token> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(head) = self.head {
            let mut idx = head;
            for _ in 0..self.len {
                out.push(Token {
                    index: idx,
                    generation: self.slots[idx].generation,
                });
                idx = self.slots[idx].next;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(k: u64) -> Entry<u64, u64> {
        Entry::new(k, k, 1)
    }

    #[test]
    fn push_and_order() {
        let mut list = RecencyList::with_capacity(4);
        let t0 = list.push_front(e(0));
        let t1 = list.push_front(e(1));
        let t2 = list.push_front(e(2));
        assert_eq!(list.len(), 3);
        assert_eq!(
            list.tokens_front_to_back(),
            vec![t2, t1, t0],
            "most recently pushed is at the front"
        );
        assert_eq!(list.tokens_back_to_front(), vec![t0, t1, t2]);
    }

    #[test]
    fn move_to_front_reorders() {
        let mut list = RecencyList::with_capacity(4);
        let t0 = list.push_front(e(0));
        let t1 = list.push_front(e(1));
        let t2 = list.push_front(e(2));
        assert!(list.move_to_front(t0));
        assert_eq!(list.tokens_front_to_back(), vec![t0, t2, t1]);
    }

    #[test]
    fn remove_invalidates_token() {
        let mut list = RecencyList::with_capacity(4);
        let t0 = list.push_front(e(0));
        let t1 = list.push_front(e(1));
        assert!(list.remove(t0).is_some());
        assert_eq!(list.len(), 1);
        assert!(list.remove(t0).is_none(), "stale token rejected");
        assert!(list.peek(t1).is_some());
    }

    #[test]
    fn reused_slot_gets_fresh_generation() {
        let mut list = RecencyList::with_capacity(1);
        let t0 = list.push_front(e(0));
        list.remove(t0).unwrap();
        let t1 = list.push_front(e(1));
        assert!(list.peek(t0).is_none(), "old token must not alias the new node");
        assert!(list.peek(t1).is_some());
    }

    #[test]
    fn drain_empties_list() {
        let mut list = RecencyList::with_capacity(4);
        list.push_front(e(0));
        list.push_front(e(1));
        let drained = list.drain();
        assert_eq!(drained.len(), 2);
        assert!(list.is_empty());
        assert!(list.tokens_front_to_back().is_empty());
    }
}
