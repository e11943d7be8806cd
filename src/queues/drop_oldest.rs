use super::recover;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO that never blocks its producer.
///
/// When full, [`push`](Self::push) evicts the oldest item to make room.
#[derive(Debug)]
pub struct DropOldestQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> DropOldestQueue<T> {
    /// Create a queue holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Queue capacity must be greater than 0");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append `item`, returning the evicted oldest item if the queue was full
    pub fn push(&self, item: T) -> Option<T> {
        let mut items = recover(self.items.lock());
        let dropped = if items.len() >= self.capacity {
            items.pop_front()
        } else {
            None
        };
        items.push_back(item);
        dropped
    }

    /// Remove the oldest item without waiting
    pub fn try_pop(&self) -> Option<T> {
        recover(self.items.lock()).pop_front()
    }

    /// Number of queued items
    #[must_use]
    pub fn len(&self) -> usize {
        recover(self.items.lock()).len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
