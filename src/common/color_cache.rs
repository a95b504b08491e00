//! Color cache of recently seen ARGB pixels.
//!
//! Both sides of the codec must insert pixels at exactly the same points in
//! the stream, so the cache lives in `common` and is shared verbatim.

use alloc::vec;
use alloc::vec::Vec;

const HASH_MUL: u32 = 0x1e35a7bd;

/// Largest cache exponent the bitstream allows.
pub const MAX_CACHE_BITS: u8 = 11;

/// Fixed-size cache addressed by a multiplicative hash of the pixel value.
///
/// `bits == 0` means the cache is absent; inserts become no-ops.
#[derive(Debug, Clone)]
pub struct ColorCache {
    colors: Vec<u32>,
    hash_shift: u32,
}

impl ColorCache {
    /// Create a cache with `1 << bits` slots, or an absent cache for bits 0.
    pub fn new(bits: u8) -> Self {
        debug_assert!(bits <= MAX_CACHE_BITS);
        if bits == 0 {
            Self {
                colors: Vec::new(),
                hash_shift: 0,
            }
        } else {
            Self {
                colors: vec![0; 1 << bits],
                hash_shift: 32 - u32::from(bits),
            }
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Number of cache slots (0 when absent).
    #[inline]
    pub fn size(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    fn index_of(&self, argb: u32) -> usize {
        (argb.wrapping_mul(HASH_MUL) >> self.hash_shift) as usize
    }

    #[inline]
    pub fn insert(&mut self, argb: u32) {
        if self.is_present() {
            let index = self.index_of(argb);
            self.colors[index] = argb;
        }
    }

    /// Pixel stored at `index`. The caller has already range-checked the
    /// index against the transmitted alphabet.
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.colors[index]
    }
}
