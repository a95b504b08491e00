//! VP8L lossless encoding internals.

pub mod backward_refs;
pub mod bitwriter;
pub mod encode;
pub mod huffman;
pub mod transforms;
