//! ARGB pixel packing helpers.
//!
//! VP8L fixes the packing as `A<<24 | R<<16 | G<<8 | B`; every round-trip
//! guarantee in this crate depends on these accessors matching it exactly.

/// Extract the alpha channel.
#[inline]
pub const fn argb_alpha(argb: u32) -> u8 {
    (argb >> 24) as u8
}

/// Extract the red channel.
#[inline]
pub const fn argb_red(argb: u32) -> u8 {
    (argb >> 16) as u8
}

/// Extract the green channel.
#[inline]
pub const fn argb_green(argb: u32) -> u8 {
    (argb >> 8) as u8
}

/// Extract the blue channel.
#[inline]
pub const fn argb_blue(argb: u32) -> u8 {
    argb as u8
}

/// Pack four channels into an ARGB pixel.
#[inline]
pub const fn make_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Ceiling division by a power of two, used for every block/sub-image size.
#[inline]
pub const fn subsample_size(size: u32, bits: u32) -> u32 {
    (size + (1 << bits) - 1) >> bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        let p = make_argb(0x12, 0x34, 0x56, 0x78);
        assert_eq!(p, 0x12345678);
        assert_eq!(argb_alpha(p), 0x12);
        assert_eq!(argb_red(p), 0x34);
        assert_eq!(argb_green(p), 0x56);
        assert_eq!(argb_blue(p), 0x78);
    }

    #[test]
    fn subsample_rounds_up() {
        assert_eq!(subsample_size(16, 2), 4);
        assert_eq!(subsample_size(17, 2), 5);
        assert_eq!(subsample_size(1, 3), 1);
    }
}
