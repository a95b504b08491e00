//! Configurable limits for decoding.
//!
//! The 14-bit header fields let a file of a few dozen bytes declare a
//! 16384x16384 image; the limits are checked before the output buffer is
//! allocated.

use crate::decoder::api::DecodeError;

/// Caps on the decoded image size.
///
/// All limits are optional; `None` means unlimited.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,

    /// Maximum image height in pixels.
    pub max_height: Option<u32>,

    /// Maximum total pixels (width * height).
    /// Useful for limiting memory even with odd aspect ratios.
    pub max_total_pixels: Option<u64>,
}

impl Default for Limits {
    /// Default limits suitable for untrusted inputs.
    ///
    /// - Max dimensions: 16384 x 16384 (the format maximum)
    /// - Max total pixels: 100 megapixels
    fn default() -> Self {
        Self {
            max_width: Some(16384),
            max_height: Some(16384),
            max_total_pixels: Some(100_000_000),
        }
    }
}

impl Limits {
    /// Create limits with no restrictions.
    ///
    /// **Warning**: Only use this for trusted inputs!
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_total_pixels: None,
        }
    }

    /// Set maximum dimensions.
    #[must_use]
    pub fn max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Set maximum total pixels.
    #[must_use]
    pub fn max_total_pixels(mut self, pixels: u64) -> Self {
        self.max_total_pixels = Some(pixels);
        self
    }

    /// Check header dimensions against the limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if let Some(max) = self.max_width {
            if width > max {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "width {width} exceeds limit {max}"
                )));
            }
        }

        if let Some(max) = self.max_height {
            if height > max {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "height {height} exceeds limit {max}"
                )));
            }
        }

        if let Some(max) = self.max_total_pixels {
            let total = u64::from(width) * u64::from(height);
            if total > max {
                return Err(DecodeError::InvalidParameter(alloc::format!(
                    "total pixels {total} exceeds limit {max}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = Limits::default();
        assert!(limits.max_width.is_some());
        assert!(limits.max_height.is_some());
    }

    #[test]
    fn check_dimensions_ok() {
        let limits = Limits::default().max_dimensions(1000, 1000);
        assert!(limits.check_dimensions(500, 500).is_ok());
        assert!(limits.check_dimensions(1000, 1000).is_ok());
    }

    #[test]
    fn check_dimensions_too_large() {
        let limits = Limits::default().max_dimensions(1000, 1000);
        assert!(limits.check_dimensions(1001, 500).is_err());
    }

    #[test]
    fn check_total_pixels() {
        let limits = Limits::none().max_total_pixels(1_000_000);
        assert!(limits.check_dimensions(1000, 1000).is_ok());
        assert!(limits.check_dimensions(1001, 1000).is_err());
    }

    #[test]
    fn no_limits() {
        let limits = Limits::none();
        assert!(limits.check_dimensions(u32::MAX, u32::MAX).is_ok());
    }
}
