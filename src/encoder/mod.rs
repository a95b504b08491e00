//! Lossless WebP (VP8L) encoding.

pub mod api;
pub mod vp8l;

pub use api::{encode_argb, EncodeError, EncoderConfig};
