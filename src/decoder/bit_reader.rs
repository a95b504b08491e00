//! LSB-first bit reader over a borrowed byte slice.
//!
//! Reads past the end return zero bits and latch a sticky error flag; the
//! decoder checks the flag once per logical unit instead of threading a
//! `Result` through every bit.

/// Bit-level cursor over `data`, least significant bit of each byte first.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: u64,
    error: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_pos: 0,
            error: false,
        }
    }

    #[inline]
    fn total_bits(&self) -> u64 {
        (self.data.len() as u64) * 8
    }

    /// A read ran past the end of the input.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Read a single bit, or 0 with the error flag set past the end.
    #[inline]
    pub fn read_bit(&mut self) -> u32 {
        if self.bit_pos >= self.total_bits() {
            self.error = true;
            return 0;
        }
        let byte = self.data[(self.bit_pos >> 3) as usize];
        let bit = (byte >> (self.bit_pos & 7)) & 1;
        self.bit_pos += 1;
        u32::from(bit)
    }

    /// Read `n` bits (n <= 32), LSB-first.
    pub fn read_bits(&mut self, n: u8) -> u32 {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for i in 0..n {
            value |= self.read_bit() << i;
        }
        value
    }

    /// Current position in bits from the start of the buffer.
    #[inline]
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }
}
