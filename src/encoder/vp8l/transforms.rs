//! Forward pixel transforms applied before entropy coding.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use crate::common::pixel::{argb_alpha, argb_blue, argb_green, argb_red, make_argb, subsample_size};

/// Largest palette the color-indexing transform can describe.
pub const MAX_PALETTE_SIZE: usize = 256;

/// Subtract the green channel from red and blue, modulo 256.
pub fn apply_subtract_green(pixels: &mut [u32]) {
    for pixel in pixels.iter_mut() {
        let green = argb_green(*pixel);
        let red = argb_red(*pixel).wrapping_sub(green);
        let blue = argb_blue(*pixel).wrapping_sub(green);
        *pixel = (*pixel & 0xff00ff00) | (u32::from(red) << 16) | u32::from(blue);
    }
}

/// Collect the distinct colors of the image in sorted order, or `None` when
/// there are too many for a palette.
pub fn build_palette(pixels: &[u32]) -> Option<Vec<u32>> {
    let mut colors = BTreeSet::new();
    for &pixel in pixels {
        colors.insert(pixel);
        if colors.len() > MAX_PALETTE_SIZE {
            return None;
        }
    }
    Some(colors.into_iter().collect())
}

/// Packing exponent: how many index pixels share one byte (1 << bits).
pub fn palette_packing_bits(num_colors: usize) -> u32 {
    if num_colors > 16 {
        0
    } else if num_colors > 4 {
        1
    } else if num_colors > 2 {
        2
    } else {
        3
    }
}

/// Replace each pixel by its palette index and bundle rows into packed
/// pixels. Indices live in the green channel, several per byte when the
/// palette is small. Returns the packed image and its width.
pub fn apply_color_indexing(
    pixels: &[u32],
    width: u32,
    height: u32,
    palette: &[u32],
) -> (Vec<u32>, u32) {
    let index_of: BTreeMap<u32, u32> = palette
        .iter()
        .enumerate()
        .map(|(i, &color)| (color, i as u32))
        .collect();

    let bits = palette_packing_bits(palette.len());
    let packed_width = subsample_size(width, bits);
    let pixels_per_packed = 1u32 << bits;
    let bits_per_pixel = 8 >> bits;

    let mut packed = vec![0u32; packed_width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            let index = index_of[&pixels[(y * width + x) as usize]];
            let shift = (x % pixels_per_packed) * bits_per_pixel;
            let slot = &mut packed[(y * packed_width + x / pixels_per_packed) as usize];
            let green = u32::from(argb_green(*slot)) | (index << shift);
            *slot = 0xff000000 | (green << 8);
        }
    }
    (packed, packed_width)
}

/// Per-channel modular difference; the inverse of the decoder's palette
/// reconstruction.
fn sub_pixels(a: u32, b: u32) -> u32 {
    make_argb(
        argb_alpha(a).wrapping_sub(argb_alpha(b)),
        argb_red(a).wrapping_sub(argb_red(b)),
        argb_green(a).wrapping_sub(argb_green(b)),
        argb_blue(a).wrapping_sub(argb_blue(b)),
    )
}

/// Delta-code the palette so neighboring colors compress well.
pub fn delta_encode_palette(palette: &[u32]) -> Vec<u32> {
    let mut encoded = Vec::with_capacity(palette.len());
    let mut prev = 0u32;
    for &color in palette {
        encoded.push(sub_pixels(color, prev));
        prev = color;
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::lossless_transform::{add_pixels, Transform, TransformType};

    #[test]
    fn subtract_green_round_trip() {
        let original: Vec<u32> = (0..64)
            .map(|i| make_argb(0xff, (i * 7) as u8, (i * 13) as u8, (i * 29) as u8))
            .collect();
        let mut pixels = original.clone();
        apply_subtract_green(&mut pixels);
        let t = Transform {
            kind: TransformType::SubtractGreen,
            bits: 0,
            data: alloc::vec::Vec::new(),
        };
        t.inverse(&mut pixels, 8, 8).unwrap();
        assert_eq!(pixels, original);
    }

    #[test]
    fn palette_rejects_too_many_colors() {
        let pixels: Vec<u32> = (0..300u32).collect();
        assert!(build_palette(&pixels).is_none());
    }

    #[test]
    fn packing_bits_by_palette_size() {
        assert_eq!(palette_packing_bits(256), 0);
        assert_eq!(palette_packing_bits(17), 0);
        assert_eq!(palette_packing_bits(16), 1);
        assert_eq!(palette_packing_bits(5), 1);
        assert_eq!(palette_packing_bits(4), 2);
        assert_eq!(palette_packing_bits(3), 2);
        assert_eq!(palette_packing_bits(2), 3);
        assert_eq!(palette_packing_bits(1), 3);
    }

    #[test]
    fn two_color_indexing_round_trip() {
        // Two colors pack eight indices per byte.
        let a = make_argb(0xff, 0, 0, 0);
        let b = make_argb(0xff, 0xff, 0xff, 0xff);
        let width = 11u32;
        let original: Vec<u32> = (0..width).map(|x| if x % 3 == 0 { a } else { b }).collect();
        let palette = build_palette(&original).unwrap();
        let (packed, packed_width) = apply_color_indexing(&original, width, 1, &palette);
        assert_eq!(packed_width, 2);
        assert_eq!(packed.len(), 2);

        let t = Transform {
            kind: TransformType::ColorIndexing,
            bits: palette_packing_bits(palette.len()),
            data: palette,
        };
        let mut pixels = vec![0u32; width as usize];
        pixels[..packed.len()].copy_from_slice(&packed);
        t.inverse(&mut pixels, width, 1).unwrap();
        assert_eq!(pixels, original);
    }

    #[test]
    fn palette_delta_coding_round_trip() {
        let palette = alloc::vec![0xff000000u32, 0xff0000ff, 0xff00ff00, 0x80ff0001];
        let encoded = delta_encode_palette(&palette);
        let mut decoded = encoded.clone();
        for i in 1..decoded.len() {
            decoded[i] = add_pixels(decoded[i], decoded[i - 1]);
        }
        assert_eq!(decoded, palette);
    }
}
