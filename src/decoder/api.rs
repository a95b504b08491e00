//! Public decode entry points and error type.

use alloc::string::String;
use alloc::vec::Vec;

use byteorder_lite::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::decoder::limits::Limits;
use crate::decoder::lossless::{DecodedImage, Vp8lDecoder};

/// Errors that can occur when decoding a WebP lossless image
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// An IO error occurred while reading the file
    #[cfg(feature = "std")]
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    /// RIFF's "RIFF" signature not found or invalid
    #[error("Invalid RIFF signature: {0:x?}")]
    RiffSignatureInvalid([u8; 4]),

    /// WebP's "WEBP" signature not found or invalid
    #[error("Invalid WebP signature: {0:x?}")]
    WebpSignatureInvalid([u8; 4]),

    /// Chunk header was not `VP8L`
    #[error("Invalid chunk header: {0:x?}")]
    ChunkHeaderInvalid([u8; 4]),

    /// The file holds a lossy (VP8) stream, which this crate does not decode
    #[error("Lossy (VP8) WebP is not supported")]
    UnsupportedLossy,

    /// The file ended before the declared data did
    #[error("File ended unexpectedly")]
    TruncatedFile,

    /// Signature of 0x2f not found
    #[error("Invalid lossless signature: {0:x?}")]
    LosslessSignatureInvalid(u8),

    /// A transform type occurred more than once
    #[error("Duplicate transform")]
    DuplicateTransform,

    /// Invalid color cache bits
    #[error("Invalid color cache bits: {0}")]
    InvalidColorCacheBits(u8),

    /// An invalid Huffman code was encountered
    #[error("Invalid Huffman code")]
    HuffmanError,

    /// A decode limit was exceeded
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The bitstream was somehow corrupt
    #[error("Corrupt bitstream")]
    BitStreamError,
}

const RIFF_HEADER_LEN: usize = 12;

/// Decode a lossless WebP file into ARGB pixels.
///
/// Returns the pixel buffer in row-major `A<<24|R<<16|G<<8|B` packing along
/// with the image dimensions.
pub fn decode_argb(data: &[u8]) -> Result<(Vec<u32>, u32, u32), DecodeError> {
    let image = decode_image(data)?;
    Ok((image.pixels, image.width, image.height))
}

/// Decode a lossless WebP file, keeping the header metadata.
///
/// Applies [`Limits::default`]; use [`decode_image_with_limits`] to widen or
/// tighten them.
pub fn decode_image(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_image_with_limits(data, &Limits::default())
}

/// Decode a lossless WebP file under caller-supplied [`Limits`].
pub fn decode_image_with_limits(data: &[u8], limits: &Limits) -> Result<DecodedImage, DecodeError> {
    let payload = parse_container(data)?;
    Vp8lDecoder::new(payload).decode(limits)
}

/// Strip the RIFF container and return the VP8L payload.
fn parse_container(data: &[u8]) -> Result<&[u8], DecodeError> {
    if data.len() < RIFF_HEADER_LEN {
        return Err(DecodeError::TruncatedFile);
    }
    let riff = [data[0], data[1], data[2], data[3]];
    if &riff != b"RIFF" {
        return Err(DecodeError::RiffSignatureInvalid(riff));
    }
    let riff_size = LittleEndian::read_u32(&data[4..8]) as usize;
    let webp = [data[8], data[9], data[10], data[11]];
    if &webp != b"WEBP" {
        return Err(DecodeError::WebpSignatureInvalid(webp));
    }
    if data.len() < RIFF_HEADER_LEN + 4 {
        return Err(DecodeError::TruncatedFile);
    }
    let tag = [data[12], data[13], data[14], data[15]];
    match &tag {
        b"VP8L" => {}
        b"VP8 " => return Err(DecodeError::UnsupportedLossy),
        _ => return Err(DecodeError::ChunkHeaderInvalid(tag)),
    }
    // The RIFF size covers the form type, the chunk tag and the payload.
    if riff_size < 8 {
        return Err(DecodeError::TruncatedFile);
    }
    let payload_len = riff_size - 8;
    let payload = &data[RIFF_HEADER_LEN + 4..];
    if payload.len() < payload_len {
        return Err(DecodeError::TruncatedFile);
    }
    Ok(&payload[..payload_len])
}
