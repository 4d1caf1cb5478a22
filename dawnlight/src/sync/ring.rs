//! Bounded FIFO channel over a ring buffer.
//!
//! Same blocking contract as [`Mailbox`](super::Mailbox) but with room for
//! several pending items, for sources that produce in bursts. The ring
//! keeps explicit `full`/`empty` flags because `head == tail` alone cannot
//! tell an exactly-full ring from an empty one.

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use super::Closed;

struct Ring<T> {
    buffer: Vec<Option<T>>,
    head: usize,
    tail: usize,
    full: bool,
    empty: bool,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            full: false,
            empty: true,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else if self.empty {
            0
        } else {
            (self.tail + self.capacity() - self.head) % self.capacity()
        }
    }

    fn push(&mut self, item: T) {
        debug_assert!(!self.full);
        self.buffer[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.empty = false;
        self.full = self.tail == self.head;
    }

    fn pop(&mut self) -> Option<T> {
        if self.empty {
            return None;
        }
        let item = self.buffer[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.full = false;
        self.empty = self.head == self.tail;
        item
    }
}

pub struct RingChannel<T> {
    ring: Mutex<Ring<T>>,
    /// One permit per free slot.
    free: Semaphore,
    /// One permit per stored item.
    filled: Semaphore,
    put_lock: AsyncMutex<()>,
    get_lock: AsyncMutex<()>,
}

impl<T> RingChannel<T> {
    /// Create a channel holding up to `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be at least 1");
        Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            free: Semaphore::new(capacity),
            filled: Semaphore::new(0),
            put_lock: AsyncMutex::new(()),
            get_lock: AsyncMutex::new(()),
        }
    }

    /// Append `item`, waiting while the ring is full.
    pub async fn put(&self, item: T) -> Result<(), Closed<T>> {
        let _producer = self.put_lock.lock().await;

        match self.free.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(Closed(item)),
        }

        self.ring.lock().push(item);
        self.filled.add_permits(1);
        Ok(())
    }

    /// Remove the oldest item, waiting while the ring is empty.
    pub async fn get(&self) -> Result<T, Closed<()>> {
        let _consumer = self.get_lock.lock().await;

        self.filled.acquire().await.map_err(|_| Closed(()))?.forget();

        let item = self.ring.lock().pop();
        self.free.add_permits(1);

        match item {
            Some(item) => Ok(item),
            None => unreachable!("filled permit granted for an empty ring"),
        }
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().empty
    }

    pub fn is_full(&self) -> bool {
        self.ring.lock().full
    }

    pub fn close(&self) {
        self.free.close();
        self.filled.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time;

    use super::*;

    #[test]
    fn len_is_unambiguous_at_boundaries() {
        let mut ring = Ring::with_capacity(3);
        assert_eq!(ring.len(), 0);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        assert!(ring.full);
        assert_eq!(ring.head, ring.tail);
        assert_eq!(ring.len(), 3);

        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert!(ring.empty);
        assert_eq!(ring.head, ring.tail);
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn len_counts_across_wraparound() {
        let mut ring = Ring::with_capacity(4);
        for n in 0..3 {
            ring.push(n);
        }
        ring.pop();
        ring.pop();
        ring.push(3);
        ring.push(4);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), Some(4));
    }

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let channel = RingChannel::new(4);
        for n in 0..4 {
            channel.put(n).await.unwrap();
        }
        assert!(channel.is_full());
        assert_eq!(channel.len(), 4);

        for n in 0..4 {
            assert_eq!(channel.get().await.unwrap(), n);
        }
        assert!(channel.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn put_blocks_when_full() {
        let channel = Arc::new(RingChannel::new(2));
        channel.put('a').await.unwrap();
        channel.put('b').await.unwrap();

        let blocked = time::timeout(Duration::from_secs(1), channel.put('c')).await;
        assert!(blocked.is_err());

        assert_eq!(channel.get().await.unwrap(), 'a');
        channel.put('c').await.unwrap();
        assert_eq!(channel.get().await.unwrap(), 'b');
        assert_eq!(channel.get().await.unwrap(), 'c');
    }

    #[tokio::test(start_paused = true)]
    async fn get_blocks_when_empty() {
        let channel = RingChannel::<u32>::new(2);
        let blocked = time::timeout(Duration::from_secs(1), channel.get()).await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn close_rejects_producers() {
        let channel = RingChannel::new(1);
        channel.close();
        assert_eq!(channel.put(5).await, Err(Closed(5)));
        assert_eq!(channel.get().await, Err(Closed(())));
    }

    #[test]
    #[should_panic(expected = "ring capacity")]
    fn zero_capacity_panics() {
        let _ = RingChannel::<u8>::new(0);
    }
}
