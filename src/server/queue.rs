//! # Bounded Work Queue
//! src/server/queue.rs
//!
//! The single coordination point between the acceptor (sole producer) and
//! the workers (competing consumers). FIFO, bounded, blocking on both ends.
//!
//! ```text
//! acceptor ──push──▶ [ c3 | c2 | c1 ] ──pop──▶ worker N
//!            (blocks when full)    (blocks when empty)
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe bounded FIFO queue
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Signalled when an item arrives
    not_empty: Condvar,

    /// Signalled when a slot frees up
    not_full: Condvar,

    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item, waiting while the queue is full
    ///
    /// Gives the item back if the queue is (or becomes) closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();

        while state.items.len() >= self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.closed {
            return Err(item);
        }

        state.items.push_back(item);
        self.not_empty.notify_one();

        Ok(())
    }

    /// Takes the oldest item, waiting while the queue is empty
    ///
    /// Returns `None` once the queue is closed.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if state.closed {
                return None;
            }

            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }

            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Closes the queue and wakes every waiting producer and consumer
    ///
    /// Items still queued are dropped.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(3);

        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
    }

    #[test]
    fn test_capacity() {
        let queue = BoundedQueue::new(2);

        queue.push(1).unwrap();
        queue.push(2).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.capacity(), 2);

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let queue = BoundedQueue::<u8>::new(0);
        assert_eq!(queue.capacity(), 1);
    }

    #[test]
    fn test_push_blocks_until_slot_frees() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push("first").unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let producer = thread::spawn({
            let queue = Arc::clone(&queue);
            move || {
                queue.push("second").unwrap();
                done_tx.send(()).unwrap();
            }
        });

        // Still blocked: the only slot is taken
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

        assert_eq!(queue.pop(), Some("first"));
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(queue.pop(), Some("second"));

        producer.join().unwrap();
    }

    #[test]
    fn test_pop_blocks_until_item_arrives() {
        let queue = Arc::new(BoundedQueue::new(4));

        let consumer = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.pop()
        });

        thread::sleep(Duration::from_millis(50));
        queue.push(42).unwrap();

        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn test_close_wakes_consumers() {
        let queue = Arc::new(BoundedQueue::<u32>::new(1));

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for consumer in consumers {
            assert_eq!(consumer.join().unwrap(), None);
        }
        assert!(queue.is_closed());
    }

    #[test]
    fn test_close_wakes_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();

        let producer = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.push(2)
        });

        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(producer.join().unwrap(), Err(2));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_every_item_consumed_exactly_once() {
        let queue = Arc::new(BoundedQueue::new(2));
        let (seen_tx, seen_rx) = mpsc::channel();

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let seen_tx = seen_tx.clone();
                thread::spawn(move || {
                    while let Some(item) = queue.pop() {
                        seen_tx.send(item).unwrap();
                    }
                })
            })
            .collect();
        drop(seen_tx);

        for item in 0..100 {
            queue.push(item).unwrap();
        }

        let mut seen: Vec<u32> = (0..100)
            .map(|_| seen_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        queue.close();
        for consumer in consumers {
            consumer.join().unwrap();
        }

        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<u32>>());
    }
}
