// Pixel Buffer - Stores 24-bit RGB pixel data for one display frame
//
// Every buffer in the pipeline has the same fixed resolution, chosen once
// at construction. Pixels are packed 0xRRGGBB values in row-major order.

use crate::pipeline::PipelineError;

/// Default display width in pixels (handheld LCD)
pub const DEFAULT_WIDTH: usize = 160;

/// Default display height in pixels (handheld LCD)
pub const DEFAULT_HEIGHT: usize = 144;

/// Mask selecting the 24 color bits of a packed pixel
pub const RGB_MASK: u32 = 0x00FF_FFFF;

/// Frame buffer holding packed 24-bit RGB pixels
///
/// The length is always `width * height` and never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Create a new buffer initialized to black
    ///
    /// # Errors
    /// Returns `InvalidResolution` if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidResolution { width, height });
        }

        Ok(Self {
            width,
            height,
            pixels: vec![0; width * height],
        })
    }

    /// Wrap existing pixel data
    ///
    /// # Errors
    /// Returns `BufferLengthMismatch` if `pixels.len() != width * height`.
    pub fn from_pixels(
        width: usize,
        height: usize,
        pixels: Vec<u32>,
    ) -> Result<Self, PipelineError> {
        let mut buffer = Self::new(width, height)?;
        if pixels.len() != buffer.pixels.len() {
            return Err(PipelineError::BufferLengthMismatch {
                expected: buffer.pixels.len(),
                found: pixels.len(),
            });
        }
        buffer.pixels = pixels;
        Ok(buffer)
    }

    /// Buffer width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels (`width * height`)
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always false; a buffer has at least one pixel
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Set a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: u32) {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.pixels[y * self.width + x] = rgb & RGB_MASK;
    }

    /// Get a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> u32 {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.pixels[y * self.width + x]
    }

    /// Fill the whole buffer with one color
    pub fn clear(&mut self, rgb: u32) {
        self.pixels.fill(rgb & RGB_MASK);
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Copy pixel data from a slice of the same length
    ///
    /// # Panics
    /// Panics if the lengths differ. Every buffer in a pipeline is sized
    /// from the same configuration, so a mismatch is a construction bug.
    pub fn copy_from_slice(&mut self, other: &[u32]) {
        assert_eq!(
            other.len(),
            self.pixels.len(),
            "pixel buffer length mismatch"
        );
        self.pixels.copy_from_slice(other);
    }

    /// Convert the buffer to tightly packed RGB888 bytes
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixels.len() * 3);
        for &pixel in &self.pixels {
            rgb.push(((pixel >> 16) & 0xFF) as u8);
            rgb.push(((pixel >> 8) & 0xFF) as u8);
            rgb.push((pixel & 0xFF) as u8);
        }
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = PixelBuffer::new(DEFAULT_WIDTH, DEFAULT_HEIGHT).unwrap();
        assert_eq!(buffer.len(), DEFAULT_WIDTH * DEFAULT_HEIGHT);
        assert!(buffer.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(matches!(
            PixelBuffer::new(0, 144),
            Err(PipelineError::InvalidResolution { width: 0, height: 144 })
        ));
        assert!(PixelBuffer::new(160, 0).is_err());
    }

    #[test]
    fn test_from_pixels_length_mismatch() {
        let err = PixelBuffer::from_pixels(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::BufferLengthMismatch {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_set_get_pixel_masks_alpha() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.set_pixel(3, 2, 0xFF12_3456);
        assert_eq!(buffer.get_pixel(3, 2), 0x12_3456);
        assert_eq!(buffer.as_slice()[2 * 4 + 3], 0x12_3456);
    }

    #[test]
    fn test_clear() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.set_pixel(0, 0, 0xABCDEF);
        buffer.clear(0x101010);
        assert_eq!(buffer.get_pixel(0, 0), 0x101010);
        assert_eq!(buffer.get_pixel(3, 3), 0x101010);
    }

    #[test]
    fn test_to_rgb_bytes() {
        let buffer = PixelBuffer::from_pixels(2, 1, vec![0x123456, 0xFF0080]).unwrap();
        assert_eq!(
            buffer.to_rgb_bytes(),
            vec![0x12, 0x34, 0x56, 0xFF, 0x00, 0x80]
        );
    }

    #[test]
    #[should_panic]
    fn test_set_pixel_out_of_bounds_x() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.set_pixel(4, 0, 0);
    }

    #[test]
    #[should_panic(expected = "pixel buffer length mismatch")]
    fn test_copy_from_wrong_length() {
        let mut buffer = PixelBuffer::new(4, 4).unwrap();
        buffer.copy_from_slice(&[0; 3]);
    }
}
