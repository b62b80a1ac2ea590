//! stream/reorder.rs
//! Index-keyed reassembly ring.
//!
//! Results arrive in completion order and leave in index order. A result for
//! index `i` lives in slot `i % capacity`; the caller guarantees no more than
//! `capacity` indices are outstanding past the write cursor, so slots never
//! collide.

use crate::types::StreamError;

pub struct ReorderRing<T> {
    slots: Vec<Option<(i64, T)>>,
    next: i64,
    held: usize,
}

impl<T> ReorderRing<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, next: 0, held: 0 }
    }

    /// Next index to be released.
    #[inline]
    pub fn next_index(&self) -> i64 {
        self.next
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.held
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.held == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, index: i64, item: T) -> Result<(), StreamError> {
        if index < self.next {
            return Err(StreamError::Pipeline("duplicate chunk behind the write cursor"));
        }
        if (index - self.next) as u64 >= self.capacity() as u64 {
            return Err(StreamError::Pipeline("chunk outside the reassembly window"));
        }
        let slot = (index as u64 % self.capacity() as u64) as usize;
        if self.slots[slot].is_some() {
            return Err(StreamError::Pipeline("reassembly slot collision"));
        }
        self.slots[slot] = Some((index, item));
        self.held += 1;
        Ok(())
    }

    /// Release the item at the write cursor if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let slot = (self.next as u64 % self.capacity() as u64) as usize;
        match self.slots[slot].take() {
            Some((index, item)) if index == self.next => {
                self.next += 1;
                self.held -= 1;
                Some(item)
            }
            other => {
                self.slots[slot] = other;
                None
            }
        }
    }
}
