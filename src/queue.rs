//! Fixed-capacity byte ring buffer used to stage raw UART traffic.
//!
//! ```text
//! ┌──────────┬───────────────────────┬──────────────────────┐
//! │ consumed │    buffered bytes     │     free space       │
//! └──────────┴───────────────────────┴──────────────────────┘
//!            ▲                       ▲
//!         read_idx               write_idx      (both wrap modulo N)
//! ```
//!
//! Overflow is not an error: a byte pushed into a full queue is dropped
//! and the queue is left untouched. No operation allocates.
//!
//! The protocol loop is cooperative (drivers append, the engine consumes
//! from the same task), so plain indices are enough; there is no atomic
//! producer/consumer split here.

/// Circular byte buffer with capacity `N`.
pub struct ByteQueue<const N: usize> {
    data: [u8; N],
    read_idx: usize,
    write_idx: usize,
    len: usize,
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            read_idx: 0,
            write_idx: 0,
            len: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Remaining free space in bytes.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Append a byte. Silently dropped when the queue is full.
    pub fn push(&mut self, byte: u8) {
        if self.is_full() {
            return;
        }
        self.data[self.write_idx] = byte;
        self.write_idx = (self.write_idx + 1) % N;
        self.len += 1;
    }

    /// Append as many bytes from `bytes` as fit; returns how many were taken.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.free());
        for &b in &bytes[..take] {
            self.push(b);
        }
        take
    }

    /// Byte `offset` positions past the read cursor, without consuming it.
    ///
    /// Returns `0x00` when `offset` is outside the buffered range.
    pub fn peek(&self, offset: usize) -> u8 {
        if offset >= self.len {
            return 0x00;
        }
        self.data[(self.read_idx + offset) % N]
    }

    /// Remove and return the byte at the read cursor.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.data[self.read_idx];
        self.data[self.read_idx] = 0x00;
        self.read_idx = (self.read_idx + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Retract the most recently pushed byte.
    pub fn drop_last(&mut self) {
        if self.is_empty() {
            return;
        }
        self.write_idx = if self.write_idx == 0 {
            N - 1
        } else {
            self.write_idx - 1
        };
        self.data[self.write_idx] = 0x00;
        self.len -= 1;
    }

    /// 1-based distance from the read cursor to the first `needle`.
    pub fn find(&self, needle: u8) -> Option<usize> {
        (0..self.len)
            .find(|&i| self.data[(self.read_idx + i) % N] == needle)
            .map(|i| i + 1)
    }

    /// Empty the queue and zero its storage.
    pub fn clear(&mut self) {
        self.data = [0u8; N];
        self.read_idx = 0;
        self.write_idx = 0;
        self.len = 0;
    }
}
