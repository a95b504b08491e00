//! VP8L bitstream decoder: header, transforms, meta-Huffman codes and the
//! LZ77-coded pixel stream.

use alloc::vec;
use alloc::vec::Vec;

use crate::common::color_cache::{ColorCache, MAX_CACHE_BITS};
use crate::common::lz77::{distance_code_to_distance, prefix_decode, prefix_extra_bits};
use crate::common::pixel::subsample_size;
use crate::decoder::api::DecodeError;
use crate::decoder::bit_reader::BitReader;
use crate::decoder::huffman::HuffmanTree;
use crate::decoder::limits::Limits;
use crate::decoder::lossless_transform::{add_pixels, Transform, TransformType};

/// A meta-Huffman code bundles five trees.
pub const HUFFMAN_CODES_PER_META_CODE: usize = 5;

pub const GREEN: usize = 0;
pub const RED: usize = 1;
pub const BLUE: usize = 2;
pub const ALPHA: usize = 3;
pub const DIST_PREFIX: usize = 4;

/// Base alphabet sizes; the green alphabet additionally grows by the color
/// cache size.
const ALPHABET_SIZE: [usize; HUFFMAN_CODES_PER_META_CODE] = [256 + 24, 256, 256, 256, 40];

pub const CODE_LENGTH_CODES: usize = 19;
pub const CODE_LENGTH_CODE_ORDER: [usize; CODE_LENGTH_CODES] = [
    17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

struct HuffmanGroup {
    trees: Vec<HuffmanTree>,
}

/// Entropy image mapping pixel blocks to meta-Huffman code indices.
struct MetaInfo {
    entropy_image: Vec<u32>,
    bits: u32,
    xsize: u32,
}

/// Fully decoded VP8L image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Row-major ARGB pixels.
    pub pixels: Vec<u32>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// The header's alpha hint bit.
    pub alpha_is_used: bool,
}

pub struct Vp8lDecoder<'a> {
    reader: BitReader<'a>,
    width: u32,
    height: u32,
    alpha_is_used: bool,
    transforms: Vec<Transform>,
    /// Width of the index image when a color-indexing transform packs
    /// several indices per byte; 0 when no palette is in effect.
    color_indexing_xsize: u32,
}

impl<'a> Vp8lDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BitReader::new(data),
            width: 0,
            height: 0,
            alpha_is_used: false,
            transforms: Vec::new(),
            color_indexing_xsize: 0,
        }
    }

    pub fn decode(mut self, limits: &Limits) -> Result<DecodedImage, DecodeError> {
        self.read_header()?;
        limits.check_dimensions(self.width, self.height)?;
        let mut pixels = vec![0u32; self.width as usize * self.height as usize];

        while self.reader.read_bit() == 1 {
            self.read_transform()?;
        }
        self.check_reader()?;
        self.read_spatially_coded_image(&mut pixels)?;

        // Invert in reverse of the order the transforms were transmitted.
        let (width, height) = (self.width, self.height);
        for transform in self.transforms.iter().rev() {
            transform.inverse(&mut pixels, width, height)?;
        }
        Ok(DecodedImage {
            pixels,
            width,
            height,
            alpha_is_used: self.alpha_is_used,
        })
    }

    fn check_reader(&self) -> Result<(), DecodeError> {
        if self.reader.is_error() {
            Err(DecodeError::BitStreamError)
        } else {
            Ok(())
        }
    }

    fn read_header(&mut self) -> Result<(), DecodeError> {
        // Stream length field; present but never validated.
        let _stream_length = self.reader.read_bits(32);
        let signature = self.reader.read_bits(8) as u8;
        self.check_reader()?;
        if signature != 0x2f {
            return Err(DecodeError::LosslessSignatureInvalid(signature));
        }
        self.width = self.reader.read_bits(14) + 1;
        self.height = self.reader.read_bits(14) + 1;
        self.alpha_is_used = self.reader.read_bits(1) == 1;
        let _version = self.reader.read_bits(3);
        self.check_reader()
    }

    fn read_transform(&mut self) -> Result<(), DecodeError> {
        let kind = match self.reader.read_bits(2) {
            0 => TransformType::Predictor,
            1 => TransformType::ColorTransform,
            2 => TransformType::SubtractGreen,
            _ => TransformType::ColorIndexing,
        };
        if self.transforms.iter().any(|t| t.kind == kind) {
            return Err(DecodeError::DuplicateTransform);
        }
        let transform = match kind {
            TransformType::Predictor | TransformType::ColorTransform => {
                let bits = self.reader.read_bits(3) + 2;
                let block_xsize = subsample_size(self.width, bits);
                let block_ysize = subsample_size(self.height, bits);
                let data = self.read_entropy_coded_image(block_xsize, block_ysize)?;
                Transform { kind, bits, data }
            }
            TransformType::ColorIndexing => {
                let num_colors = self.reader.read_bits(8) + 1;
                let bits = if num_colors > 16 {
                    0
                } else if num_colors > 4 {
                    1
                } else if num_colors > 2 {
                    2
                } else {
                    3
                };
                self.color_indexing_xsize = subsample_size(self.width, bits);
                let mut palette = self.read_entropy_coded_image(num_colors, 1)?;
                // The palette is delta coded per byte lane.
                for i in 1..palette.len() {
                    palette[i] = add_pixels(palette[i], palette[i - 1]);
                }
                Transform {
                    kind,
                    bits,
                    data: palette,
                }
            }
            TransformType::SubtractGreen => Transform {
                kind,
                bits: 0,
                data: Vec::new(),
            },
        };
        self.transforms.push(transform);
        self.check_reader()
    }

    fn read_color_cache_bits(&mut self) -> Result<u8, DecodeError> {
        if self.reader.read_bit() == 1 {
            let bits = self.reader.read_bits(4) as u8;
            if bits > MAX_CACHE_BITS {
                return Err(DecodeError::InvalidColorCacheBits(bits));
            }
            Ok(bits)
        } else {
            Ok(0)
        }
    }

    fn read_entropy_coded_image(
        &mut self,
        xsize: u32,
        ysize: u32,
    ) -> Result<Vec<u32>, DecodeError> {
        let cache_bits = self.read_color_cache_bits()?;
        let cache = ColorCache::new(cache_bits);
        let group = self.read_huffman_group(cache.size())?;
        let mut data = vec![0u32; xsize as usize * ysize as usize];
        self.read_lz77_coded_image(&[group], None, xsize, ysize, &mut data, cache)?;
        Ok(data)
    }

    fn read_spatially_coded_image(&mut self, pixels: &mut [u32]) -> Result<(), DecodeError> {
        let cache_bits = self.read_color_cache_bits()?;
        let cache = ColorCache::new(cache_bits);

        let use_meta_huffman = self.reader.read_bit() == 1;
        self.check_reader()?;
        let mut num_groups = 1usize;
        let meta = if use_meta_huffman {
            let bits = self.reader.read_bits(3) + 2;
            let huffman_xsize = subsample_size(self.width, bits);
            let huffman_ysize = subsample_size(self.height, bits);
            let mut entropy_image = self.read_entropy_coded_image(huffman_xsize, huffman_ysize)?;
            // The meta-code index sits in the red and green channels.
            for pixel in &mut entropy_image {
                let index = (*pixel >> 8) & 0xffff;
                *pixel = index;
                if index as usize >= num_groups {
                    num_groups = index as usize + 1;
                }
            }
            Some(MetaInfo {
                entropy_image,
                bits,
                xsize: huffman_xsize,
            })
        } else {
            None
        };

        let mut groups = Vec::with_capacity(num_groups);
        for _ in 0..num_groups {
            groups.push(self.read_huffman_group(cache.size())?);
        }

        let xsize = if self.color_indexing_xsize == 0 {
            self.width
        } else {
            self.color_indexing_xsize
        };
        let height = self.height;
        self.read_lz77_coded_image(&groups, meta.as_ref(), xsize, height, pixels, cache)
    }

    fn read_huffman_group(&mut self, cache_size: usize) -> Result<HuffmanGroup, DecodeError> {
        let mut trees = Vec::with_capacity(HUFFMAN_CODES_PER_META_CODE);
        for (i, &base) in ALPHABET_SIZE.iter().enumerate() {
            let alphabet_size = if i == GREEN { base + cache_size } else { base };
            trees.push(self.read_code(alphabet_size)?);
        }
        Ok(HuffmanGroup { trees })
    }

    fn read_code(&mut self, alphabet_size: usize) -> Result<HuffmanTree, DecodeError> {
        let is_simple = self.reader.read_bit() == 1;
        let tree = if is_simple {
            let num_symbols = self.reader.read_bit() + 1;
            let first_is_8bit = self.reader.read_bit() == 1;
            let first = self
                .reader
                .read_bits(if first_is_8bit { 8 } else { 1 }) as u16;
            self.check_reader()?;
            if usize::from(first) >= alphabet_size {
                return Err(DecodeError::HuffmanError);
            }
            if num_symbols == 2 {
                let second = self.reader.read_bits(8) as u16;
                self.check_reader()?;
                if usize::from(second) >= alphabet_size {
                    return Err(DecodeError::HuffmanError);
                }
                HuffmanTree::from_explicit(&[1, 1], &[0, 1], &[first, second])?
            } else {
                HuffmanTree::from_explicit(&[0], &[0], &[first])?
            }
        } else {
            let num_codes = self.reader.read_bits(4) as usize + 4;
            let mut code_length_code_lengths = [0u8; CODE_LENGTH_CODES];
            for i in 0..num_codes {
                code_length_code_lengths[CODE_LENGTH_CODE_ORDER[i]] =
                    self.reader.read_bits(3) as u8;
            }
            self.check_reader()?;
            let code_lengths = self.read_code_lengths(&code_length_code_lengths, alphabet_size)?;
            HuffmanTree::from_code_lengths(&code_lengths)?
        };
        self.check_reader()?;
        Ok(tree)
    }

    fn read_code_lengths(
        &mut self,
        code_length_code_lengths: &[u8],
        num_symbols: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        let tree = HuffmanTree::from_code_lengths(code_length_code_lengths)?;

        let mut max_symbol = if self.reader.read_bit() == 1 {
            let length_nbits = 2 + 2 * self.reader.read_bits(3) as u8;
            let max_symbol = 2 + self.reader.read_bits(length_nbits) as usize;
            if max_symbol > num_symbols {
                return Err(DecodeError::HuffmanError);
            }
            max_symbol
        } else {
            num_symbols
        };

        let mut code_lengths = vec![0u8; num_symbols];
        let mut symbol = 0usize;
        let mut prev_code_len = 8u8;
        while symbol < num_symbols {
            if max_symbol == 0 {
                break;
            }
            max_symbol -= 1;
            let code_len = tree.read_symbol(&mut self.reader);
            if code_len < 16 {
                code_lengths[symbol] = code_len as u8;
                symbol += 1;
                if code_len != 0 {
                    prev_code_len = code_len as u8;
                }
            } else {
                let (repeat_count, repeat_last) = match code_len {
                    16 => (self.reader.read_bits(2) as usize + 3, true),
                    17 => (self.reader.read_bits(3) as usize + 3, false),
                    _ => (self.reader.read_bits(7) as usize + 11, false),
                };
                if symbol + repeat_count > num_symbols {
                    return Err(DecodeError::HuffmanError);
                }
                let fill = if repeat_last { prev_code_len } else { 0 };
                for _ in 0..repeat_count {
                    code_lengths[symbol] = fill;
                    symbol += 1;
                }
            }
        }
        self.check_reader()?;
        Ok(code_lengths)
    }

    fn read_lz77_coded_image(
        &mut self,
        groups: &[HuffmanGroup],
        meta: Option<&MetaInfo>,
        xsize: u32,
        ysize: u32,
        data: &mut [u32],
        mut cache: ColorCache,
    ) -> Result<(), DecodeError> {
        let total = xsize as usize * ysize as usize;
        if data.len() < total {
            return Err(DecodeError::BitStreamError);
        }
        let cache_limit = 256 + 24 + cache.size();
        let mut fills = 0usize;
        let mut last_cached = 0usize;
        let mut x = 0u32;
        let mut y = 0u32;
        while fills < total {
            let group = match meta {
                Some(info) if groups.len() > 1 => {
                    let index = (y >> info.bits) * info.xsize + (x >> info.bits);
                    &groups[info.entropy_image[index as usize] as usize]
                }
                _ => &groups[0],
            };
            let s = group.trees[GREEN].read_symbol(&mut self.reader) as usize;
            self.check_reader()?;
            if s < 256 {
                let red = group.trees[RED].read_symbol(&mut self.reader) as u32;
                let blue = group.trees[BLUE].read_symbol(&mut self.reader) as u32;
                let alpha = group.trees[ALPHA].read_symbol(&mut self.reader) as u32;
                data[fills] = (alpha << 24) | (red << 16) | ((s as u32) << 8) | blue;
                fills += 1;
                x += 1;
                if x >= xsize {
                    x = 0;
                    y += 1;
                    while last_cached < fills {
                        cache.insert(data[last_cached]);
                        last_cached += 1;
                    }
                }
            } else if s < 256 + 24 {
                let length = self.read_prefix_coded_value((s - 256) as u16);
                let dist_symbol = group.trees[DIST_PREFIX].read_symbol(&mut self.reader);
                let distance_code = self.read_prefix_coded_value(dist_symbol);
                let distance = distance_code_to_distance(xsize, distance_code) as usize;
                self.check_reader()?;
                let length = length as usize;
                if distance == 0 || distance > fills || fills + length > total {
                    return Err(DecodeError::BitStreamError);
                }
                for _ in 0..length {
                    data[fills] = data[fills - distance];
                    fills += 1;
                    x += 1;
                    if x >= xsize {
                        x = 0;
                        y += 1;
                    }
                }
                while last_cached < fills {
                    cache.insert(data[last_cached]);
                    last_cached += 1;
                }
            } else {
                if s >= cache_limit {
                    return Err(DecodeError::BitStreamError);
                }
                let key = s - 256 - 24;
                while last_cached < fills {
                    cache.insert(data[last_cached]);
                    last_cached += 1;
                }
                data[fills] = cache.get(key);
                fills += 1;
                x += 1;
                if x >= xsize {
                    x = 0;
                    y += 1;
                    while last_cached < fills {
                        cache.insert(data[last_cached]);
                        last_cached += 1;
                    }
                }
            }
        }
        self.check_reader()
    }

    fn read_prefix_coded_value(&mut self, symbol: u16) -> u32 {
        let extra_bits_count = prefix_extra_bits(symbol);
        let extra_bits = self.reader.read_bits(extra_bits_count);
        prefix_decode(symbol, extra_bits)
    }
}
