//! Fixed-capacity FIFO that overwrites its oldest entry when full.
//!
//! [`RingBuffer`] is the arrival buffer for spawn-ready emotes. Bursts are
//! parked here until the drain scheduler admits them one at a time. When a
//! burst is larger than the buffer, the newest items win: the head is evicted
//! and handed back to the caller so it can be counted or dropped.

use anyhow::{Result, ensure};

/// A bounded queue backed by a fixed slot array.
///
/// `start` points at the logical head and `len` tracks how many slots are
/// occupied. Slots outside `start..start + len` (mod capacity) are always
/// `None`, so dequeued items are released immediately.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    start: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items.
    ///
    /// A capacity of zero is rejected, there would be no slot to overwrite.
    pub fn new(capacity: usize) -> Result<Self> {
        ensure!(capacity >= 1, "ring buffer capacity must be at least 1");
        let slots = (0..capacity).map(|_| None).collect();
        Ok(Self {
            slots,
            start: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Insert `item` at the tail.
    ///
    /// If the buffer is full the head is overwritten and returned. The new
    /// item becomes the tail, so FIFO order among retained items holds.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        if self.is_full() {
            // the head slot is also the slot right after the tail
            let evicted = self.slots[self.start].replace(item);
            self.start = (self.start + 1) % capacity;
            return evicted;
        }
        let insert_idx = (self.start + self.len) % capacity;
        self.slots[insert_idx] = Some(item);
        self.len += 1;
        None
    }

    /// Remove and return the head, or `None` if nothing is queued.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let out = self.slots[self.start].take();
        self.start = (self.start + 1) % self.capacity();
        self.len -= 1;
        out
    }

    /// Head to tail, without consuming anything.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        (0..self.len)
            .filter_map(move |offset| self.slots[(self.start + offset) % capacity].as_ref())
    }

    /// Dequeue everything in FIFO order.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { buffer: self }
    }
}

/// Draining iterator returned by [`RingBuffer::drain`].
///
/// Items not pulled from the iterator stay in the buffer.
pub struct Drain<'a, T> {
    buffer: &'a mut RingBuffer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.dequeue()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.buffer.len(), Some(self.buffer.len()))
    }
}
