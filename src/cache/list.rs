//! Key List Module
//!
//! Insertion-ordered set of keys backed by an arena of doubly linked nodes.
//!
//! Nodes live in a `Vec` and link to each other by slot index, with a hash
//! index from key to slot. Push, remove and move-to-back are all O(1) and no
//! element is ever shifted.

use std::collections::HashMap;

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Key List ==
/// Ordered key set with O(1) reordering.
///
/// - Front = oldest
/// - Back = newest
#[derive(Debug, Default)]
pub(crate) struct KeyList {
    /// Node arena, `None` marks a free slot
    slots: Vec<Option<Node>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    /// Key to slot index
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl KeyList {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys in the list.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Push Back ==
    /// Appends a key at the back.
    ///
    /// Returns `false` without changing the order if the key is already present.
    pub fn push_back(&mut self, key: &str) -> bool {
        if self.index.contains_key(key) {
            return false;
        }

        let node = Node {
            key: key.to_string(),
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        self.link_back(slot);
        self.index.insert(key.to_string(), slot);
        true
    }

    // == Remove ==
    /// Removes a key, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(slot) = self.index.remove(key) else {
            return false;
        };

        self.unlink(slot);
        self.slots[slot] = None;
        self.free.push(slot);
        true
    }

    // == Move To Back ==
    /// Moves a key to the back (newest position).
    ///
    /// Returns `false` if the key is not present.
    pub fn move_to_back(&mut self, key: &str) -> bool {
        let Some(&slot) = self.index.get(key) else {
            return false;
        };

        if self.tail != Some(slot) {
            self.unlink(slot);
            self.link_back(slot);
        }
        true
    }

    // == Front ==
    /// Returns the oldest key without removing it.
    pub fn front(&self) -> Option<&str> {
        self.head.map(|slot| self.node(slot).key.as_str())
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Removes every key and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    fn node(&self, slot: usize) -> &Node {
        self.slots[slot]
            .as_ref()
            .unwrap_or_else(|| unreachable!("linked slot {slot} is free"))
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.slots[slot]
            .as_mut()
            .unwrap_or_else(|| unreachable!("linked slot {slot} is free"))
    }

    fn link_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(slot);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => self.node_mut(tail).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }
}

/// Iterator over a [`KeyList`] from oldest to newest.
pub(crate) struct Iter<'a> {
    list: &'a KeyList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.node(slot);
        self.cursor = node.next;
        Some(node.key.as_str())
    }
}
