//! Lossless WebP (VP8L) decoding and encoding.
//!
//! This crate implements the lossless half of the WebP format: the VP8L
//! bitstream (canonical Huffman coding, LZ77 back-references, a color cache
//! and four reversible pixel transforms) inside a RIFF container.
//!
//! Pixels are `u32` values packed as `A<<24 | R<<16 | G<<8 | B`, row-major.
//!
//! # Decoding
//!
//! ```no_run
//! let file = std::fs::read("image.webp").unwrap();
//! let (pixels, width, height) = webp_lossless::decode_argb(&file).unwrap();
//! assert_eq!(pixels.len(), width as usize * height as usize);
//! ```
//!
//! # Encoding
//!
//! ```
//! use webp_lossless::EncoderConfig;
//!
//! let pixels = vec![0xff336699u32; 16];
//! let config = EncoderConfig::new().palette(true);
//! let file = webp_lossless::encode_argb(&pixels, 4, 4, &config).unwrap();
//! let (decoded, _, _) = webp_lossless::decode_argb(&file).unwrap();
//! assert_eq!(decoded, pixels);
//! ```
//!
//! # no_std Support
//!
//! Both decoding and encoding work in `no_std` environments (requires
//! `alloc`); the `std` feature only adds `std::io::Error` conversions.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

mod common;
mod decoder;
mod encoder;

pub use decoder::{
    decode_argb, decode_image, decode_image_with_limits, DecodeError, DecodedImage, Limits,
};
pub use encoder::{encode_argb, EncodeError, EncoderConfig};
