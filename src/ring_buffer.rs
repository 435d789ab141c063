//! Bounded byte queue with overflow accounting
//!
//! The buffer borrows its storage for its whole lifetime and never allocates.
//! Writes that do not fit are refused rather than wrapped over unread data,
//! and each refusal is counted.

/// Storage handed to [`RingBuffer::new`] was unusable
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapacityError {
    /// Storage of length 0, or element width of 0
    Zero,
    /// Storage length (the wrapped value) is not a multiple of the element
    /// width
    Unaligned(usize),
}

/// A write was refused because the buffer is at capacity
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overflow;

/// Fixed-capacity FIFO of bytes
///
/// `head` is the next byte to be read, `tail` the next position to be
/// written. The element width does not change how bytes are stored, but
/// capacity is guaranteed to hold a whole number of elements so that
/// [`RingBuffer::write_all`] and [`RingBuffer::read_exact`] of one element
/// either fully succeed or leave the buffer untouched.
pub struct RingBuffer<'a> {
    storage: &'a mut [u8],
    element_width: usize,
    head: usize,
    tail: usize,
    used: usize,
    overflow_count: usize,
}

impl<'a> RingBuffer<'a> {
    /// Take over `storage` as an empty buffer of `storage.len()` bytes.
    pub fn new(storage: &'a mut [u8], element_width: usize) -> Result<Self, CapacityError> {
        if storage.is_empty() || element_width == 0 {
            return Err(CapacityError::Zero);
        }
        if storage.len() % element_width != 0 {
            return Err(CapacityError::Unaligned(storage.len()));
        }
        Ok(Self {
            storage,
            element_width,
            head: 0,
            tail: 0,
            used: 0,
            overflow_count: 0,
        })
    }

    /// Total number of bytes the buffer can hold
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Width of one element in bytes
    pub fn element_width(&self) -> usize {
        self.element_width
    }

    /// Number of unread bytes
    pub fn len(&self) -> usize {
        self.used
    }

    /// Number of bytes that can be written before the buffer is full
    pub fn free(&self) -> usize {
        self.capacity() - self.used
    }

    /// Returns `true` if there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Returns `true` if the next write will be refused
    pub fn is_full(&self) -> bool {
        self.used == self.capacity()
    }

    /// Number of writes refused since construction or the last
    /// [`RingBuffer::reset`]
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    fn advance(&self, index: usize, by: usize) -> usize {
        (index + by) % self.capacity()
    }

    /// Append one byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Overflow> {
        if self.is_full() {
            self.overflow_count = self.overflow_count.wrapping_add(1);
            return Err(Overflow);
        }
        self.storage[self.tail] = byte;
        self.tail = self.advance(self.tail, 1);
        self.used += 1;
        Ok(())
    }

    /// Remove and return the oldest byte.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.storage[self.head];
        self.head = self.advance(self.head, 1);
        self.used -= 1;
        Some(byte)
    }

    /// Append all of `bytes`, or nothing at all.
    ///
    /// A refused write counts as a single overflow regardless of its length.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        if bytes.len() > self.free() {
            self.overflow_count = self.overflow_count.wrapping_add(1);
            return Err(Overflow);
        }
        // At most two contiguous runs: up to the end of storage, then from 0.
        let first = bytes.len().min(self.capacity() - self.tail);
        let (front, back) = bytes.split_at(first);
        self.storage[self.tail..self.tail + first].copy_from_slice(front);
        self.storage[..back.len()].copy_from_slice(back);
        self.tail = self.advance(self.tail, bytes.len());
        self.used += bytes.len();
        Ok(())
    }

    /// Copy up to `out.len()` unread bytes into `out` without consuming them.
    ///
    /// Returns the number of bytes copied.
    pub fn peek_many(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.used);
        let first = n.min(self.capacity() - self.head);
        out[..first].copy_from_slice(&self.storage[self.head..self.head + first]);
        out[first..n].copy_from_slice(&self.storage[..n - first]);
        n
    }

    /// Fill `out` completely from the front of the buffer.
    ///
    /// Returns `None` and consumes nothing if fewer than `out.len()` bytes
    /// are stored.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Option<()> {
        if out.len() > self.used {
            return None;
        }
        self.peek_many(out);
        self.discard(out.len());
        Some(())
    }

    /// Drop up to `n` bytes from the front. Returns the number dropped.
    pub fn discard(&mut self, n: usize) -> usize {
        let n = n.min(self.used);
        self.head = self.advance(self.head, n);
        self.used -= n;
        n
    }

    /// Forget all contents and clear the overflow counter.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.used = 0;
        self.overflow_count = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_unusable_storage() {
        let mut empty: [u8; 0] = [];
        assert_eq!(
            RingBuffer::new(&mut empty, 4).err(),
            Some(CapacityError::Zero)
        );
        let mut storage = [0u8; 10];
        assert_eq!(
            RingBuffer::new(&mut storage, 0).err(),
            Some(CapacityError::Zero)
        );
        assert_eq!(
            RingBuffer::new(&mut storage, 4).err(),
            Some(CapacityError::Unaligned(10))
        );
        assert!(RingBuffer::new(&mut storage, 5).is_ok());
    }

    #[test]
    fn elements_come_out_in_order() {
        let mut storage = [0u8; 12];
        let mut rb = RingBuffer::new(&mut storage, 4).unwrap();
        let elements = [[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]];
        for e in &elements {
            rb.write_all(e).unwrap();
        }
        assert!(rb.is_full());
        for e in &elements {
            let mut out = [0; 4];
            rb.read_exact(&mut out).unwrap();
            assert_eq!(&out, e);
        }
        assert!(rb.is_empty());
        assert_eq!(rb.overflow_count(), 0);
    }

    #[test]
    fn full_buffer_refuses_without_corruption() {
        let mut storage = [0u8; 8];
        let mut rb = RingBuffer::new(&mut storage, 4).unwrap();
        rb.write_all(&[1, 1, 1, 1]).unwrap();
        rb.write_all(&[2, 2, 2, 2]).unwrap();

        assert_eq!(rb.write_all(&[3, 3, 3, 3]), Err(Overflow));
        assert_eq!(rb.overflow_count(), 1);
        assert_eq!(rb.write_byte(3), Err(Overflow));
        assert_eq!(rb.overflow_count(), 2);

        let mut out = [0; 8];
        assert_eq!(rb.peek_many(&mut out), 8);
        assert_eq!(out, [1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(rb.len(), 8);
    }

    #[test]
    fn partial_element_does_not_fit() {
        let mut storage = [0u8; 8];
        let mut rb = RingBuffer::new(&mut storage, 4).unwrap();
        rb.write_all(&[1, 2, 3, 4]).unwrap();
        rb.write_byte(5).unwrap();
        assert_eq!(rb.write_all(&[6, 7, 8, 9]), Err(Overflow));
        assert_eq!(rb.len(), 5);
        assert_eq!(rb.overflow_count(), 1);
    }

    #[test]
    fn cursors_wrap_around() {
        let mut storage = [0u8; 8];
        let mut rb = RingBuffer::new(&mut storage, 4).unwrap();
        for round in 0..5u8 {
            rb.write_all(&[round; 4]).unwrap();
            rb.write_all(&[round + 100; 4]).unwrap();
            let mut out = [0; 4];
            rb.read_exact(&mut out).unwrap();
            assert_eq!(out, [round; 4]);
            rb.read_exact(&mut out).unwrap();
            assert_eq!(out, [round + 100; 4]);
        }
        // Straddle the end of storage
        rb.write_all(&[0xaa; 4]).unwrap();
        assert_eq!(rb.discard(4), 4);
        rb.write_all(&[1, 2, 3, 4, 5, 6]).unwrap();
        let mut out = [0; 6];
        assert_eq!(rb.peek_many(&mut out), 6);
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut storage = [0u8; 4];
        let mut rb = RingBuffer::new(&mut storage, 2).unwrap();
        rb.write_all(&[7, 8]).unwrap();
        let mut out = [0; 4];
        assert_eq!(rb.peek_many(&mut out), 2);
        assert_eq!(rb.peek_many(&mut out), 2);
        assert_eq!(&out[..2], &[7, 8]);
        assert_eq!(rb.read_byte(), Some(7));
        assert_eq!(rb.read_byte(), Some(8));
        assert_eq!(rb.read_byte(), None);
    }

    #[test]
    fn read_exact_needs_enough_bytes() {
        let mut storage = [0u8; 4];
        let mut rb = RingBuffer::new(&mut storage, 2).unwrap();
        rb.write_byte(1).unwrap();
        let mut out = [0; 2];
        assert_eq!(rb.read_exact(&mut out), None);
        assert_eq!(rb.len(), 1);
    }

    #[test]
    fn reset_clears_contents_and_counter() {
        let mut storage = [0u8; 2];
        let mut rb = RingBuffer::new(&mut storage, 1).unwrap();
        rb.write_byte(1).unwrap();
        rb.write_byte(2).unwrap();
        assert!(rb.write_byte(3).is_err());
        rb.reset();
        assert!(rb.is_empty());
        assert_eq!(rb.overflow_count(), 0);
        rb.write_byte(4).unwrap();
        assert_eq!(rb.read_byte(), Some(4));
    }
}
