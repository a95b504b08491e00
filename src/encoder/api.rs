//! Public encode entry points, configuration and error type.

use alloc::vec::Vec;

use byteorder_lite::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::encoder::vp8l::encode::encode_vp8l;

/// Largest dimension the 14-bit header fields can carry.
pub const MAX_DIMENSION: u32 = 1 << 14;

/// Errors that can occur when encoding a WebP lossless image
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// An IO error occurred while writing the file
    #[cfg(feature = "std")]
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    /// Width or height is zero or exceeds the format limit
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested image width.
        width: u32,
        /// Requested image height.
        height: u32,
    },

    /// The pixel buffer does not match width * height
    #[error("Invalid buffer size: expected {expected}, got {got}")]
    InvalidBufferSize {
        /// Pixel count implied by the dimensions.
        expected: usize,
        /// Pixel count actually supplied.
        got: usize,
    },

    /// A Huffman code exceeded the depth the bitstream can describe
    #[error("Code length too long: max allowed {max_allowed}, got {got}")]
    CodeLengthTooLong {
        /// Deepest code the tree description can carry.
        max_allowed: u8,
        /// Depth the optimal tree required.
        got: u8,
    },
}

/// Encoder policy knobs. Both transforms default to off, which produces a
/// plain spatially coded stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderConfig {
    /// Use a color-indexing transform when the image has at most 256
    /// distinct colors.
    pub use_palette: bool,
    /// Subtract the green channel from red and blue before coding. Ignored
    /// when a palette is used.
    pub use_subtract_green: bool,
}

impl EncoderConfig {
    /// Default configuration: no transforms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the color-indexing transform.
    pub fn palette(mut self, enabled: bool) -> Self {
        self.use_palette = enabled;
        self
    }

    /// Enable or disable the subtract-green transform.
    pub fn subtract_green(mut self, enabled: bool) -> Self {
        self.use_subtract_green = enabled;
        self
    }
}

/// Encode ARGB pixels into a lossless WebP file.
pub fn encode_argb(
    pixels: &[u32],
    width: u32,
    height: u32,
    config: &EncoderConfig,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidBufferSize {
            expected,
            got: pixels.len(),
        });
    }

    let payload = encode_vp8l(pixels, width, height, config)?;

    let mut out = Vec::with_capacity(16 + payload.len());
    out.extend_from_slice(b"RIFF");
    let mut size = [0u8; 4];
    // Form type, chunk tag and payload are covered by the RIFF size.
    LittleEndian::write_u32(&mut size, (8 + payload.len()) as u32);
    out.extend_from_slice(&size);
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(b"VP8L");
    out.extend_from_slice(&payload);
    Ok(out)
}
