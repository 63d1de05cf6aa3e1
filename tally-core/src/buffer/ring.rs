//! Fixed-capacity byte FIFO with backward peek
//!
//! ```text
//!          tail                 last  head
//!           │                    │     │
//!   ┌───┬───▼───┬───┬───┬───┬───▼───┬─▼─┬───┐
//!   │ 0 │ a │ b │ c │ d │ e │ f │ \r│ 0 │ 0 │
//!   └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
//!                             peek(1) peek(0)
//! ```
//!
//! `peek(offset)` counts backwards from the most recent write, which lets
//! the consumer look for a line terminator among freshly received bytes
//! before draining anything. `pop` takes from the head side so a terminator
//! found at `peek(0)` can be discarded on its own.

/// Ring buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Enqueue on a full buffer; the byte was dropped
    Full,
    /// Dequeue, pop or peek on an empty buffer
    Empty,
    /// Peek reached past the oldest stored byte
    OffsetOutOfBounds,
}

/// Byte FIFO of capacity `N`
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    data: [u8; N],
    /// Next write position
    head: usize,
    /// Next read position
    tail: usize,
    /// Position of the most recent write
    last: usize,
    count: usize,
    full: bool,
    /// Bytes enqueued since the consumer last asked
    new_data: usize,
    /// Enqueues rejected because the buffer was full
    overflows: u32,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Create an empty, zeroed buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            data: [0; N],
            head: 0,
            tail: 0,
            last: 0,
            count: 0,
            full: false,
            new_data: 0,
            overflows: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Number of rejected enqueues since creation
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Bytes enqueued since the last [`take_new_data`](Self::take_new_data)
    pub fn new_data(&self) -> usize {
        self.new_data
    }

    /// Return and clear the newly-arrived byte count
    pub fn take_new_data(&mut self) -> usize {
        core::mem::take(&mut self.new_data)
    }

    /// Append a byte at the head
    ///
    /// A full buffer rejects the byte rather than overwriting the oldest.
    pub fn enqueue(&mut self, byte: u8) -> Result<(), BufferError> {
        if self.full {
            self.overflows = self.overflows.wrapping_add(1);
            return Err(BufferError::Full);
        }

        self.data[self.head] = byte;
        self.last = self.head;
        self.head = (self.head + 1) % N;
        self.count += 1;
        self.full = self.count == N;
        self.new_data += 1;
        Ok(())
    }

    /// Remove the oldest byte
    pub fn dequeue(&mut self) -> Result<u8, BufferError> {
        if self.count == 0 {
            return Err(BufferError::Empty);
        }

        let byte = core::mem::take(&mut self.data[self.tail]);
        self.tail = (self.tail + 1) % N;
        self.count -= 1;
        self.full = false;
        self.new_data = self.new_data.min(self.count);
        Ok(byte)
    }

    /// Remove the newest byte
    pub fn pop(&mut self) -> Result<u8, BufferError> {
        if self.count == 0 {
            return Err(BufferError::Empty);
        }

        self.head = (self.head + N - 1) % N;
        let byte = core::mem::take(&mut self.data[self.head]);
        self.last = (self.head + N - 1) % N;
        self.count -= 1;
        self.full = false;
        self.new_data = self.new_data.min(self.count);
        Ok(byte)
    }

    /// Read the byte `offset` positions behind the most recent write
    pub fn peek(&self, offset: usize) -> Result<u8, BufferError> {
        if self.count == 0 {
            return Err(BufferError::Empty);
        }
        if offset >= self.count {
            return Err(BufferError::OffsetOutOfBounds);
        }
        Ok(self.data[(self.last + N - offset) % N])
    }

    /// Zero the storage and reset all cursors
    ///
    /// The overflow counter survives a flush.
    pub fn flush(&mut self) {
        self.data = [0; N];
        self.head = 0;
        self.tail = 0;
        self.last = 0;
        self.count = 0;
        self.full = false;
        self.new_data = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fifo_order() {
        let mut rb = RingBuffer::<4>::new();
        rb.enqueue(b'a').unwrap();
        rb.enqueue(b'b').unwrap();
        rb.enqueue(b'c').unwrap();

        assert_eq!(rb.dequeue(), Ok(b'a'));
        assert_eq!(rb.dequeue(), Ok(b'b'));
        assert_eq!(rb.len(), 1);
    }

    #[test]
    fn test_full_rejects_and_counts() {
        let mut rb = RingBuffer::<3>::new();
        for b in 1..=3 {
            rb.enqueue(b).unwrap();
        }
        assert!(rb.is_full());
        assert_eq!(rb.enqueue(9), Err(BufferError::Full));
        assert_eq!(rb.overflows(), 1);

        // Oldest byte was not overwritten
        assert_eq!(rb.dequeue(), Ok(1));
        assert!(!rb.is_full());
    }

    #[test]
    fn test_empty_operations_fail() {
        let mut rb = RingBuffer::<4>::new();
        assert_eq!(rb.dequeue(), Err(BufferError::Empty));
        assert_eq!(rb.pop(), Err(BufferError::Empty));
        assert_eq!(rb.peek(0), Err(BufferError::Empty));
    }

    #[test]
    fn test_peek_counts_back_from_last_write() {
        let mut rb = RingBuffer::<8>::new();
        for &b in b"abc" {
            rb.enqueue(b).unwrap();
        }
        assert_eq!(rb.peek(0), Ok(b'c'));
        assert_eq!(rb.peek(2), Ok(b'a'));
        assert_eq!(rb.peek(3), Err(BufferError::OffsetOutOfBounds));
    }

    #[test]
    fn test_peek_across_wrap() {
        let mut rb = RingBuffer::<4>::new();
        for &b in b"wxyz" {
            rb.enqueue(b).unwrap();
        }
        rb.dequeue().unwrap();
        rb.dequeue().unwrap();
        rb.enqueue(b'1').unwrap();

        assert_eq!(rb.peek(0), Ok(b'1'));
        assert_eq!(rb.peek(1), Ok(b'z'));
        assert_eq!(rb.peek(2), Ok(b'y'));
        assert_eq!(rb.peek(3), Err(BufferError::OffsetOutOfBounds));
    }

    #[test]
    fn test_pop_takes_newest() {
        let mut rb = RingBuffer::<4>::new();
        for &b in b"ab\r" {
            rb.enqueue(b).unwrap();
        }
        assert_eq!(rb.pop(), Ok(b'\r'));
        assert_eq!(rb.peek(0), Ok(b'b'));
        assert_eq!(rb.len(), 2);

        // Head slot reused by the next write
        rb.enqueue(b'c').unwrap();
        assert_eq!(rb.dequeue(), Ok(b'a'));
        assert_eq!(rb.dequeue(), Ok(b'b'));
        assert_eq!(rb.dequeue(), Ok(b'c'));
    }

    #[test]
    fn test_pop_wraps_below_origin() {
        let mut rb = RingBuffer::<3>::new();
        for &b in b"abc" {
            rb.enqueue(b).unwrap();
        }
        // head wrapped to 0
        assert_eq!(rb.pop(), Ok(b'c'));
        assert_eq!(rb.peek(0), Ok(b'b'));
    }

    #[test]
    fn test_new_data_counter() {
        let mut rb = RingBuffer::<8>::new();
        rb.enqueue(1).unwrap();
        rb.enqueue(2).unwrap();
        assert_eq!(rb.take_new_data(), 2);
        assert_eq!(rb.new_data(), 0);

        rb.enqueue(3).unwrap();
        rb.pop().unwrap();
        rb.pop().unwrap();
        // never more new bytes than stored bytes
        assert!(rb.new_data() <= rb.len());
    }

    #[test]
    fn test_flush_resets_but_keeps_overflows() {
        let mut rb = RingBuffer::<2>::new();
        rb.enqueue(1).unwrap();
        rb.enqueue(2).unwrap();
        let _ = rb.enqueue(3);
        rb.flush();

        assert!(rb.is_empty());
        assert!(!rb.is_full());
        assert_eq!(rb.new_data(), 0);
        assert_eq!(rb.overflows(), 1);
        assert_eq!(rb.capacity(), 2);
        assert_eq!(rb.peek(0), Err(BufferError::Empty));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue(u8),
        Dequeue,
        Pop,
        Peek(usize),
        Flush,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => any::<u8>().prop_map(Op::Enqueue),
            3 => Just(Op::Dequeue),
            1 => Just(Op::Pop),
            1 => (0usize..20).prop_map(Op::Peek),
            1 => Just(Op::Flush),
        ]
    }

    proptest! {
        #[test]
        fn prop_count_and_flags_stay_consistent(ops in proptest::collection::vec(op(), 0..200)) {
            let mut rb = RingBuffer::<8>::new();
            let mut model: [u8; 8] = [0; 8];
            let mut model_len = 0usize;

            for op in ops {
                match op {
                    Op::Enqueue(b) => {
                        let accepted = rb.enqueue(b).is_ok();
                        prop_assert_eq!(accepted, model_len < 8);
                        if accepted {
                            model[model_len] = b;
                            model_len += 1;
                        }
                    }
                    Op::Dequeue => {
                        let got = rb.dequeue().ok();
                        let want = (model_len > 0).then(|| model[0]);
                        prop_assert_eq!(got, want);
                        if model_len > 0 {
                            model.copy_within(1..model_len, 0);
                            model_len -= 1;
                        }
                    }
                    Op::Pop => {
                        let got = rb.pop().ok();
                        let want = (model_len > 0).then(|| model[model_len - 1]);
                        prop_assert_eq!(got, want);
                        model_len = model_len.saturating_sub(1);
                    }
                    Op::Peek(offset) => {
                        let got = rb.peek(offset).ok();
                        let want = (offset < model_len).then(|| model[model_len - 1 - offset]);
                        prop_assert_eq!(got, want);
                    }
                    Op::Flush => {
                        rb.flush();
                        model_len = 0;
                    }
                }

                prop_assert!(rb.len() <= rb.capacity());
                prop_assert!(!(rb.is_full() && rb.is_empty()));
                prop_assert_eq!(rb.is_full(), rb.len() == rb.capacity());
                prop_assert_eq!(rb.len(), model_len);
                prop_assert!(rb.new_data() <= rb.len());
            }
        }
    }
}
