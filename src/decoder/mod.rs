//! Lossless WebP (VP8L) decoding.

pub mod api;
pub mod bit_reader;
pub mod huffman;
pub mod limits;
pub mod lossless;
pub mod lossless_transform;

pub use api::{decode_argb, decode_image, decode_image_with_limits, DecodeError};
pub use limits::Limits;
pub use lossless::DecodedImage;
