//! Capacity-bounded store of recent events.
//!
//! Events are kept most-recent-first. Live events are prepended one at a time
//! and the oldest entries fall off the tail once the capacity is reached;
//! snapshot pages replace the whole sequence. No deduplication is performed:
//! an event seen both in a snapshot and on the stream is stored twice.

use std::collections::VecDeque;

use crate::types::Event;

/// Ordered, capacity-bounded sequence of events (most-recent-first).
#[derive(Debug, Clone)]
pub struct EventStore {
    events: VecDeque<Event>,
    capacity: usize,
    revision: u64,
}

impl EventStore {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            revision: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of writes applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Most recent event, if any.
    pub fn latest(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Events, most recent first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> + ExactSizeIterator {
        self.events.iter()
    }

    /// Prepend a live event and evict the oldest entries beyond capacity.
    pub fn merge_live(&mut self, event: Event) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
        self.revision += 1;
    }

    /// Replace the whole sequence with a snapshot page.
    ///
    /// The page is expected most-recent-first; entries beyond capacity are
    /// dropped from the tail.
    pub fn replace_snapshot(&mut self, events: Vec<Event>) {
        self.events = events.into_iter().take(self.capacity).collect();
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.revision += 1;
    }
}

impl<'a> IntoIterator for &'a EventStore {
    type Item = &'a Event;
    type IntoIter = std::collections::vec_deque::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
