//! Fixed-capacity sample queues
//!
//! Each channel owns one [`SampleQueue`]. The timer context pushes and the
//! consumer pops, so every access runs inside a critical section. Storage is
//! a `heapless::Deque` sized for the largest supported depth; the configured
//! depth only limits how much of it is used. When the queue is full the
//! oldest sample is dropped to make room.

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Deque;

/// Largest configurable queue depth
pub const MAX_QUEUE_DEPTH: usize = 100;

/// Queue depth after construction
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

/// Requested depth was zero or above [`MAX_QUEUE_DEPTH`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DepthOutOfRange;

struct Ring<T> {
    slots: Deque<T, MAX_QUEUE_DEPTH>,
    capacity: usize,
}

/// Overwrite-oldest queue shared between producer and consumer contexts
pub struct SampleQueue<T> {
    inner: Mutex<RefCell<Ring<T>>>,
}

impl<T> Default for SampleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SampleQueue<T> {
    /// Create an empty queue of [`DEFAULT_QUEUE_DEPTH`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Ring {
                slots: Deque::new(),
                capacity: DEFAULT_QUEUE_DEPTH,
            })),
        }
    }

    /// Append a sample, dropping the oldest one if the queue is full
    ///
    /// Returns `true` when a sample was overwritten.
    pub fn push(&self, sample: T) -> bool {
        critical_section::with(|cs| {
            let mut ring = self.inner.borrow_ref_mut(cs);
            let mut overwrote = false;
            while ring.slots.len() >= ring.capacity {
                ring.slots.pop_front();
                overwrote = true;
            }
            // Capacity never exceeds the backing storage, so there is room now
            let _ = ring.slots.push_back(sample);
            overwrote
        })
    }

    /// Remove and return the oldest sample
    pub fn pop(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).slots.pop_front())
    }

    /// Discard every queued sample
    pub fn flush(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).slots.clear());
    }

    /// Change the depth
    ///
    /// Shrinking keeps the newest samples.
    ///
    /// # Errors
    ///
    /// Returns [`DepthOutOfRange`] unless `1 <= depth <= MAX_QUEUE_DEPTH`; the
    /// queue is left unchanged.
    pub fn resize(&self, depth: usize) -> Result<(), DepthOutOfRange> {
        if depth == 0 || depth > MAX_QUEUE_DEPTH {
            return Err(DepthOutOfRange);
        }
        critical_section::with(|cs| {
            let mut ring = self.inner.borrow_ref_mut(cs);
            while ring.slots.len() > depth {
                ring.slots.pop_front();
            }
            ring.capacity = depth;
        });
        Ok(())
    }

    /// Number of queued samples
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).slots.len())
    }

    /// Whether no sample is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured depth
    pub fn capacity(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).capacity)
    }
}
