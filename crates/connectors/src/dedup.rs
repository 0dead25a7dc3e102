//! Bounded set of already-notified ticket ids
//!
//! Insertion-ordered so the oldest ids are evicted first. Lives for the
//! process lifetime only; a restart may re-notify open urgent tickets.

use std::collections::{HashSet, VecDeque};

/// Default number of ids retained
pub const DEFAULT_NOTIFIED_BOUND: usize = 1000;

#[derive(Debug, Default)]
pub struct NotifiedTicketSet {
    order: VecDeque<u64>,
    members: HashSet<u64>,
}

impl NotifiedTicketSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.members.contains(&id)
    }

    /// Record `id`; returns `false` if it was already present
    pub fn add(&mut self, id: u64) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        true
    }

    /// Drop the oldest ids until at most `bound` remain
    ///
    /// Returns the number of ids evicted.
    pub fn evict_to_bound(&mut self, bound: usize) -> usize {
        let excess = self.order.len().saturating_sub(bound);
        for id in self.order.drain(..excess) {
            self.members.remove(&id);
        }
        excess
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
