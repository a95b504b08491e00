//! VP8L bit writer.
//!
//! Writes bits in LSB-first order as required by the VP8L format.

use alloc::vec::Vec;

/// VP8L bit writer - writes bits LSB-first.
pub struct BitWriter {
    /// Output buffer.
    buffer: Vec<u8>,
    /// Current partial byte being built.
    bits: u64,
    /// Number of bits in the partial byte.
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            bits: 0,
            used: 0,
        }
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(cap),
            bits: 0,
            used: 0,
        }
    }

    /// Write `n_bits` from `value` (LSB-first).
    #[inline]
    pub fn write_bits(&mut self, value: u64, n_bits: u8) {
        debug_assert!(n_bits <= 32);
        debug_assert!(n_bits == 0 || (value >> n_bits) == 0);

        self.bits |= value << self.used;
        self.used += n_bits;

        while self.used >= 8 {
            self.buffer.push(self.bits as u8);
            self.bits >>= 8;
            self.used -= 8;
        }
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u64::from(bit), 1);
    }

    /// Flush the partial byte (padding with zeros) and return the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.buffer.push(self.bits as u8);
            self.bits = 0;
            self.used = 0;
        }
        self.buffer
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
