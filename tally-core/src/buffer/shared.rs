//! Ring buffer shared between an interrupt-side producer and the loop

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::ring::{BufferError, RingBuffer};

/// [`RingBuffer`] behind a blocking mutex
///
/// With `CriticalSectionRawMutex` every access runs in a short critical
/// section, so the producer may live in an interrupt or a higher priority
/// executor. The producer only calls [`enqueue`](Self::enqueue); the
/// consumer goes through [`with`](Self::with).
pub struct SharedRingBuffer<M: RawMutex, const N: usize> {
    inner: Mutex<M, RefCell<RingBuffer<N>>>,
}

impl<M: RawMutex, const N: usize> SharedRingBuffer<M, N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Producer side: append one byte
    pub fn enqueue(&self, byte: u8) -> Result<(), BufferError> {
        self.inner.lock(|rb| rb.borrow_mut().enqueue(byte))
    }

    /// Consumer side: run `f` with exclusive access to the buffer
    ///
    /// Keep `f` short; the producer is held off for its whole duration.
    pub fn with<R>(&self, f: impl FnOnce(&mut RingBuffer<N>) -> R) -> R {
        self.inner.lock(|rb| f(&mut rb.borrow_mut()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|rb| rb.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock(|rb| rb.borrow().is_full())
    }

    pub fn overflows(&self) -> u32 {
        self.inner.lock(|rb| rb.borrow().overflows())
    }
}

impl<M: RawMutex, const N: usize> Default for SharedRingBuffer<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_producer_consumer_handoff() {
        let shared = SharedRingBuffer::<NoopRawMutex, 4>::new();
        shared.enqueue(b'o').unwrap();
        shared.enqueue(b'k').unwrap();

        let drained = shared.with(|rb| {
            let a = rb.dequeue().unwrap();
            let b = rb.dequeue().unwrap();
            [a, b]
        });
        assert_eq!(&drained, b"ok");
        assert!(shared.is_empty());
    }

    #[test]
    fn test_overflow_visible_to_consumer() {
        let shared = SharedRingBuffer::<NoopRawMutex, 1>::new();
        shared.enqueue(1).unwrap();
        assert_eq!(shared.enqueue(2), Err(BufferError::Full));
        assert!(shared.is_full());
        assert_eq!(shared.overflows(), 1);
    }
}
