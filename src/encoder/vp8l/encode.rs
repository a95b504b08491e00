//! VP8L stream assembly: header, transforms, Huffman trees and the token
//! stream.

use alloc::vec;
use alloc::vec::Vec;

use crate::common::lz77::{distance_to_dist_code, prefix_encode, NUM_DISTANCE_CODES, NUM_LENGTH_CODES};
use crate::common::pixel::{argb_alpha, argb_blue, argb_green, argb_red};
use crate::encoder::api::{EncodeError, EncoderConfig};
use crate::encoder::vp8l::backward_refs::{get_backward_references, PixOrCopy};
use crate::encoder::vp8l::bitwriter::BitWriter;
use crate::encoder::vp8l::huffman::{write_huffman_tree, HuffmanTreeCodes, MAX_CODE_LENGTH};
use crate::encoder::vp8l::transforms::{
    apply_color_indexing, apply_subtract_green, build_palette, delta_encode_palette,
};

const VP8L_SIGNATURE: u8 = 0x2f;

const TRANSFORM_SUBTRACT_GREEN: u64 = 2;
const TRANSFORM_COLOR_INDEXING: u64 = 3;

/// Encode an ARGB image into a raw VP8L payload (no RIFF container).
pub fn encode_vp8l(
    pixels: &[u32],
    width: u32,
    height: u32,
    config: &EncoderConfig,
) -> Result<Vec<u8>, EncodeError> {
    let mut w = BitWriter::with_capacity(pixels.len());
    write_header(&mut w, width, height, alpha_is_used(pixels));

    let mut image = pixels.to_vec();
    let mut main_width = width;

    let mut used_palette = false;
    if config.use_palette {
        if let Some(palette) = build_palette(&image) {
            w.write_bit(true);
            w.write_bits(TRANSFORM_COLOR_INDEXING, 2);
            w.write_bits((palette.len() - 1) as u64, 8);
            write_entropy_coded_image(&mut w, &delta_encode_palette(&palette), palette.len() as u32);
            let (packed, packed_width) = apply_color_indexing(&image, width, height, &palette);
            image = packed;
            main_width = packed_width;
            used_palette = true;
        }
    }
    if !used_palette && config.use_subtract_green {
        apply_subtract_green(&mut image);
        w.write_bit(true);
        w.write_bits(TRANSFORM_SUBTRACT_GREEN, 2);
    }
    w.write_bit(false); // end of transforms

    write_spatially_coded_image(&mut w, &image, main_width);
    Ok(w.finish())
}

fn write_header(w: &mut BitWriter, width: u32, height: u32, alpha: bool) {
    // Stream length field; readers skip it without validation.
    w.write_bits(0, 32);
    w.write_bits(u64::from(VP8L_SIGNATURE), 8);
    w.write_bits(u64::from(width - 1), 14);
    w.write_bits(u64::from(height - 1), 14);
    w.write_bit(alpha);
    w.write_bits(0, 3); // version
}

fn alpha_is_used(pixels: &[u32]) -> bool {
    pixels.iter().any(|&p| argb_alpha(p) != 0xff)
}

fn write_spatially_coded_image(w: &mut BitWriter, data: &[u32], xsize: u32) {
    w.write_bit(false); // no color cache
    w.write_bit(false); // no meta-Huffman codes
    write_coded_image(w, data, xsize);
}

fn write_entropy_coded_image(w: &mut BitWriter, data: &[u32], xsize: u32) {
    w.write_bit(false); // no color cache
    write_coded_image(w, data, xsize);
}

/// Tokenize, build the five trees, and emit trees plus token stream.
fn write_coded_image(w: &mut BitWriter, data: &[u32], xsize: u32) {
    let tokens = get_backward_references(data);

    let mut green_histo = vec![0u32; 256 + NUM_LENGTH_CODES];
    let mut red_histo = vec![0u32; 256];
    let mut blue_histo = vec![0u32; 256];
    let mut alpha_histo = vec![0u32; 256];
    let mut dist_histo = vec![0u32; NUM_DISTANCE_CODES];

    for token in &tokens {
        match *token {
            PixOrCopy::Literal(pixel) => {
                green_histo[usize::from(argb_green(pixel))] += 1;
                red_histo[usize::from(argb_red(pixel))] += 1;
                blue_histo[usize::from(argb_blue(pixel))] += 1;
                alpha_histo[usize::from(argb_alpha(pixel))] += 1;
            }
            PixOrCopy::Copy { distance, length } => {
                let (length_symbol, _, _) = prefix_encode(length);
                green_histo[256 + usize::from(length_symbol)] += 1;
                let dist_code = distance_to_dist_code(xsize, distance);
                let (dist_symbol, _, _) = prefix_encode(dist_code);
                dist_histo[usize::from(dist_symbol)] += 1;
            }
        }
    }

    let green = HuffmanTreeCodes::from_histogram_clamped(&green_histo, MAX_CODE_LENGTH);
    let red = HuffmanTreeCodes::from_histogram_clamped(&red_histo, MAX_CODE_LENGTH);
    let blue = HuffmanTreeCodes::from_histogram_clamped(&blue_histo, MAX_CODE_LENGTH);
    let alpha = HuffmanTreeCodes::from_histogram_clamped(&alpha_histo, MAX_CODE_LENGTH);
    let dist = HuffmanTreeCodes::from_histogram_clamped(&dist_histo, MAX_CODE_LENGTH);

    for tree in [&green, &red, &blue, &alpha, &dist] {
        write_huffman_tree(w, tree);
    }

    for token in &tokens {
        match *token {
            PixOrCopy::Literal(pixel) => {
                green.write_symbol(w, usize::from(argb_green(pixel)));
                red.write_symbol(w, usize::from(argb_red(pixel)));
                blue.write_symbol(w, usize::from(argb_blue(pixel)));
                alpha.write_symbol(w, usize::from(argb_alpha(pixel)));
            }
            PixOrCopy::Copy { distance, length } => {
                let (length_symbol, extra_count, extra_bits) = prefix_encode(length);
                green.write_symbol(w, 256 + usize::from(length_symbol));
                if extra_count > 0 {
                    w.write_bits(u64::from(extra_bits), extra_count);
                }
                let dist_code = distance_to_dist_code(xsize, distance);
                let (dist_symbol, extra_count, extra_bits) = prefix_encode(dist_code);
                dist.write_symbol(w, usize::from(dist_symbol));
                if extra_count > 0 {
                    w.write_bits(u64::from(extra_bits), extra_count);
                }
            }
        }
    }
}
