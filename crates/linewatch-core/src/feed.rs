//! Per-line bounded feeds (most-recent-first).

use std::collections::{HashMap, VecDeque};

/// A set of per-line rings. New entries go to the head; once a line holds
/// `capacity` entries the tail is evicted.
#[derive(Debug, Clone)]
pub struct LineFeed<T> {
    capacity: usize,
    lines: HashMap<String, VecDeque<T>>,
}

impl<T: Clone> LineFeed<T> {
    /// Create an empty feed retaining at most `capacity` entries per line (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: HashMap::new(),
        }
    }

    /// Per-line retention bound.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepend an entry to a line, evicting the oldest entry on overflow.
    pub fn append(&mut self, line_id: &str, entry: T) {
        let ring = self
            .lines
            .entry(line_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        ring.push_front(entry);
        ring.truncate(self.capacity);
    }

    /// Entries for a line, most-recent-first. Unknown lines are empty.
    #[must_use]
    pub fn get(&self, line_id: &str) -> Vec<T> {
        self.lines
            .get(line_id)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of entries retained for a line.
    #[must_use]
    pub fn len(&self, line_id: &str) -> usize {
        self.lines.get(line_id).map_or(0, VecDeque::len)
    }

    /// Drop every entry of one line.
    pub fn clear(&mut self, line_id: &str) {
        self.lines.remove(line_id);
    }

    /// Drop every entry of every line.
    pub fn clear_all(&mut self) {
        self.lines.clear();
    }
}
