use std::collections::VecDeque;

/// Fixed-capacity FIFO that keeps the most recent entries.
///
/// Once full, every push evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct RollingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    /// Create an empty buffer.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "rolling buffer capacity must be greater than zero");
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// The buffered entries, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_last_hundred_in_order() {
        let mut buffer = RollingBuffer::new(100);

        for i in 0..150 {
            buffer.push(i);
            assert!(buffer.len() <= 100);
        }

        assert_eq!(buffer.snapshot(), (50..150).collect::<Vec<_>>());
        assert_eq!(buffer.oldest(), Some(&50));
        assert_eq!(buffer.latest(), Some(&149));
    }

    #[test]
    fn below_capacity_nothing_is_evicted() {
        let mut buffer = RollingBuffer::new(3);
        buffer.push("a");
        buffer.push("b");

        assert_eq!(buffer.snapshot(), vec!["a", "b"]);
        assert_eq!(buffer.capacity(), 3);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut buffer = RollingBuffer::new(2);
        buffer.push(1.0);
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.latest(), None);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_is_rejected() {
        let _ = RollingBuffer::<u8>::new(0);
    }
}
