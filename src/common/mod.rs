//! Shared pieces of the VP8L pipeline used by both the decoder and encoder.

pub mod color_cache;
pub mod lz77;
pub mod pixel;
