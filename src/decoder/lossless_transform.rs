//! Inverse pixel transforms.
//!
//! Transforms are recorded while parsing the header and inverted in reverse
//! order once the pixel stream is decoded.

use alloc::vec::Vec;

use crate::common::pixel::{argb_blue, argb_green, argb_red, subsample_size};
use crate::decoder::api::DecodeError;

/// The four transform types, in their 2-bit wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformType {
    Predictor = 0,
    ColorTransform = 1,
    SubtractGreen = 2,
    ColorIndexing = 3,
}

/// A parsed transform: its type, block/packing exponent and auxiliary image
/// (per-block modes, per-block color elements, or the palette).
#[derive(Debug, Clone)]
pub struct Transform {
    pub kind: TransformType,
    pub bits: u32,
    pub data: Vec<u32>,
}

/// Per-channel modular addition of two pixels.
#[inline]
pub fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_and_green = (a & 0xff00ff00).wrapping_add(b & 0xff00ff00);
    let red_and_blue = (a & 0x00ff00ff).wrapping_add(b & 0x00ff00ff);
    (alpha_and_green & 0xff00ff00) | (red_and_blue & 0x00ff00ff)
}

#[inline]
fn average2(a: u32, b: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0u32, 8, 16, 24] {
        let av = ((a >> shift) & 0xff) as u32;
        let bv = ((b >> shift) & 0xff) as u32;
        out |= ((av + bv) / 2) << shift;
    }
    out
}

/// Pick left or top, whichever is closer to the gradient estimate
/// `left + top - top_left` in per-channel Manhattan distance. Top wins ties.
fn select(left: u32, top: u32, top_left: u32) -> u32 {
    let mut dist_left = 0i32;
    let mut dist_top = 0i32;
    for shift in [0u32, 8, 16, 24] {
        let l = ((left >> shift) & 0xff) as i32;
        let t = ((top >> shift) & 0xff) as i32;
        let tl = ((top_left >> shift) & 0xff) as i32;
        let estimate = l + t - tl;
        dist_left += (estimate - l).abs();
        dist_top += (estimate - t).abs();
    }
    if dist_top <= dist_left {
        top
    } else {
        left
    }
}

#[inline]
fn clamp_channel(v: i32) -> u32 {
    v.clamp(0, 255) as u32
}

fn clamp_add_subtract_full(a: u32, b: u32, c: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0u32, 8, 16, 24] {
        let av = ((a >> shift) & 0xff) as i32;
        let bv = ((b >> shift) & 0xff) as i32;
        let cv = ((c >> shift) & 0xff) as i32;
        out |= clamp_channel(av + bv - cv) << shift;
    }
    out
}

fn clamp_add_subtract_half(a: u32, b: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0u32, 8, 16, 24] {
        let av = ((a >> shift) & 0xff) as i32;
        let bv = ((b >> shift) & 0xff) as i32;
        out |= clamp_channel(av + (av - bv) / 2) << shift;
    }
    out
}

/// Signed fixed-point cross-channel delta.
#[inline]
fn color_transform_delta(t: u8, c: u8) -> u8 {
    ((i32::from(t as i8) * i32::from(c as i8)) >> 5) as u8
}

impl Transform {
    /// Undo this transform in place. `pixels` holds at least
    /// `width * height` entries in row-major order.
    pub fn inverse(
        &self,
        pixels: &mut Vec<u32>,
        width: u32,
        height: u32,
    ) -> Result<(), DecodeError> {
        match self.kind {
            TransformType::Predictor => self.inverse_predictor(pixels, width, height),
            TransformType::ColorTransform => {
                self.inverse_color_transform(pixels, width, height);
                Ok(())
            }
            TransformType::SubtractGreen => {
                inverse_subtract_green(pixels, width, height);
                Ok(())
            }
            TransformType::ColorIndexing => self.inverse_color_indexing(pixels, width, height),
        }
    }

    fn inverse_predictor(
        &self,
        pixels: &mut [u32],
        width: u32,
        height: u32,
    ) -> Result<(), DecodeError> {
        let block_xsize = subsample_size(width, self.bits) as usize;
        let width = width as usize;
        for y in 0..height as usize {
            for x in 0..width {
                let i = y * width + x;
                if x == 0 && y == 0 {
                    pixels[i] = add_pixels(pixels[i], 0xff000000);
                    continue;
                }
                if x == 0 {
                    let top = pixels[i - width];
                    pixels[i] = add_pixels(pixels[i], top);
                    continue;
                }
                if y == 0 {
                    let left = pixels[i - 1];
                    pixels[i] = add_pixels(pixels[i], left);
                    continue;
                }
                let left = pixels[i - 1];
                let top = pixels[i - width];
                let top_left = pixels[i - width - 1];
                let top_right = if x == width - 1 {
                    left
                } else {
                    pixels[i - width + 1]
                };
                let block = (y >> self.bits) * block_xsize + (x >> self.bits);
                let mode = argb_green(self.data[block]);
                let predicted = match mode {
                    0 => 0xff000000,
                    1 => left,
                    2 => top,
                    3 => top_right,
                    4 => top_left,
                    5 => average2(average2(left, top_right), top),
                    6 => average2(left, top_left),
                    7 => average2(left, top),
                    8 => average2(top_left, top),
                    9 => average2(top, top_right),
                    10 => average2(average2(left, top_left), average2(top, top_right)),
                    11 => select(left, top, top_left),
                    12 => clamp_add_subtract_full(left, top, top_left),
                    13 => clamp_add_subtract_half(average2(left, top), top_left),
                    _ => return Err(DecodeError::BitStreamError),
                };
                pixels[i] = add_pixels(pixels[i], predicted);
            }
        }
        Ok(())
    }

    fn inverse_color_transform(&self, pixels: &mut [u32], width: u32, height: u32) {
        let block_xsize = subsample_size(width, self.bits) as usize;
        let width = width as usize;
        for y in 0..height as usize {
            for x in 0..width {
                let i = y * width + x;
                let block = (y >> self.bits) * block_xsize + (x >> self.bits);
                let element = self.data[block];
                // Element channels: blue lane carries green-to-red, green
                // lane green-to-blue, red lane red-to-blue.
                let green_to_red = argb_blue(element);
                let green_to_blue = argb_green(element);
                let red_to_blue = argb_red(element);

                let green = argb_green(pixels[i]);
                let mut red = argb_red(pixels[i]);
                let mut blue = argb_blue(pixels[i]);
                red = red.wrapping_add(color_transform_delta(green_to_red, green));
                blue = blue.wrapping_add(color_transform_delta(green_to_blue, green));
                blue = blue.wrapping_add(color_transform_delta(red_to_blue, red));

                pixels[i] = (pixels[i] & 0xff00ff00)
                    | (u32::from(red) << 16)
                    | u32::from(blue);
            }
        }
    }

    fn inverse_color_indexing(
        &self,
        pixels: &mut Vec<u32>,
        width: u32,
        height: u32,
    ) -> Result<(), DecodeError> {
        let width = width as usize;
        let height = height as usize;
        let pixels_per_byte = 1usize << self.bits;
        let bits_per_pixel = 8 >> self.bits;
        let mask = (1u32 << bits_per_pixel) - 1;
        let packed_xsize = subsample_size(width as u32, self.bits) as usize;

        // The front of `pixels` holds the packed index image; expand from a
        // copy so the output never overwrites indices still to be read.
        let indices: Vec<u32> = pixels[..packed_xsize * height].to_vec();
        for y in 0..height {
            for x in 0..packed_xsize {
                let packed = u32::from(argb_green(indices[y * packed_xsize + x]));
                for i in 0..pixels_per_byte {
                    let dst_x = x * pixels_per_byte + i;
                    if dst_x >= width {
                        break;
                    }
                    let index = ((packed >> (i * bits_per_pixel)) & mask) as usize;
                    if index >= self.data.len() {
                        return Err(DecodeError::BitStreamError);
                    }
                    pixels[y * width + dst_x] = self.data[index];
                }
            }
        }
        Ok(())
    }
}

fn inverse_subtract_green(pixels: &mut [u32], width: u32, height: u32) {
    for pixel in pixels.iter_mut().take((width * height) as usize) {
        let green = argb_green(*pixel);
        let red = argb_red(*pixel).wrapping_add(green);
        let blue = argb_blue(*pixel).wrapping_add(green);
        *pixel = (*pixel & 0xff00ff00) | (u32::from(red) << 16) | u32::from(blue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::pixel::make_argb;
    use alloc::vec;

    #[test]
    fn add_pixels_wraps_per_channel() {
        let a = make_argb(0xff, 0x80, 0x01, 0xf0);
        let b = make_argb(0x01, 0x90, 0x02, 0x20);
        assert_eq!(add_pixels(a, b), make_argb(0x00, 0x10, 0x03, 0x10));
    }

    #[test]
    fn subtract_green_inverse() {
        let original = make_argb(0xff, 0x40, 0x30, 0x20);
        // Forward: r -= g, b -= g.
        let transformed = make_argb(0xff, 0x10, 0x30, 0xf0);
        let mut pixels = vec![transformed];
        inverse_subtract_green(&mut pixels, 1, 1);
        assert_eq!(pixels[0], original);
    }

    #[test]
    fn predictor_black_and_left() {
        // 2x1 image, single block, mode 1 (left).
        let t = Transform {
            kind: TransformType::Predictor,
            bits: 4,
            data: vec![make_argb(0, 0, 1, 0)],
        };
        // Residuals: first pixel relative to opaque black, second to left.
        let mut pixels = vec![make_argb(0x00, 0x10, 0x20, 0x30), make_argb(0, 1, 1, 1)];
        t.inverse(&mut pixels, 2, 1).unwrap();
        assert_eq!(pixels[0], make_argb(0xff, 0x10, 0x20, 0x30));
        assert_eq!(pixels[1], make_argb(0xff, 0x11, 0x21, 0x31));
    }

    #[test]
    fn predictor_rejects_unknown_mode() {
        let t = Transform {
            kind: TransformType::Predictor,
            bits: 4,
            data: vec![make_argb(0, 0, 14, 0)],
        };
        let mut pixels = vec![0u32; 4];
        assert!(t.inverse(&mut pixels, 2, 2).is_err());
    }

    #[test]
    fn select_prefers_top_on_tie() {
        let p = make_argb(0xff, 10, 10, 10);
        assert_eq!(select(p, p, p), p);
        let left = make_argb(0xff, 0, 0, 0);
        let top = make_argb(0xff, 20, 20, 20);
        // Estimate equals left + top - top_left; with top_left == left the
        // estimate is exactly top.
        assert_eq!(select(left, top, left), top);
    }

    #[test]
    fn color_indexing_unpacks_and_clamps_rows() {
        // Width 3 with 4 indices per packed byte: one packed pixel per row,
        // fourth index slot unused.
        let palette = vec![0xff000000u32, 0xffffffff, 0xff00ff00];
        let t = Transform {
            kind: TransformType::ColorIndexing,
            bits: 2,
            data: palette.clone(),
        };
        // Indices 1, 0, 2 packed as 2-bit fields LSB-first: 0b00_10_00_01.
        let mut pixels = vec![0u32; 3];
        pixels[0] = make_argb(0xff, 0, 0b0010_0001, 0);
        t.inverse(&mut pixels, 3, 1).unwrap();
        assert_eq!(pixels, vec![palette[1], palette[0], palette[2]]);
    }

    #[test]
    fn color_indexing_rejects_out_of_range_index() {
        let t = Transform {
            kind: TransformType::ColorIndexing,
            bits: 0,
            data: vec![0xff000000],
        };
        let mut pixels = vec![make_argb(0xff, 0, 5, 0)];
        assert!(t.inverse(&mut pixels, 1, 1).is_err());
    }
}
