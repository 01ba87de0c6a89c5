// Canvas rendering - scaling and palette quantization
//
// Turns a ready frame into an image in the canvas surface's native pixel
// type: nearest-neighbour resample to the requested size, then map every
// pixel to the closest canvas palette color.

use std::collections::HashMap;

use super::palette::{CanvasColor, CanvasPalette};

/// A dense 2-D image of canvas colors, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasImage {
    width: usize,
    height: usize,
    pixels: Vec<CanvasColor>,
}

impl CanvasImage {
    /// Create an image filled with transparent pixels
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![CanvasColor::TRANSPARENT; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> CanvasColor {
        assert!(x < self.width && y < self.height, "({}, {}) out of bounds", x, y);
        self.pixels[y * self.width + x]
    }

    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: CanvasColor) {
        assert!(x < self.width && y < self.height, "({}, {}) out of bounds", x, y);
        self.pixels[y * self.width + x] = color;
    }

    pub fn as_slice(&self) -> &[CanvasColor] {
        &self.pixels
    }
}

/// Source index sampled for destination index `dst` (pixel-centre mapping)
#[inline]
fn nearest_source(dst: usize, src_len: usize, dst_len: usize) -> usize {
    ((2 * dst + 1) * src_len) / (2 * dst_len)
}

/// Resample a row-major RGB image to `dst_width x dst_height`
///
/// Nearest-neighbour: each output pixel copies the source pixel under its
/// centre. A zero-sized source or destination yields an empty result.
pub fn scale_nearest(
    src: &[u32],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<u32> {
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Vec::new();
    }
    debug_assert_eq!(src.len(), src_width * src_height);

    let columns: Vec<usize> = (0..dst_width)
        .map(|x| nearest_source(x, src_width, dst_width))
        .collect();

    let mut out = Vec::with_capacity(dst_width * dst_height);
    for y in 0..dst_height {
        let row_start = nearest_source(y, src_height, dst_height) * src_width;
        let row = &src[row_start..row_start + src_width];
        out.extend(columns.iter().map(|&x| row[x]));
    }
    out
}

/// Quantize an RGB image into canvas colors
///
/// Distinct colors are looked up once per call; console frames use few.
pub fn quantize(
    palette: &CanvasPalette,
    rgb: &[u32],
    width: usize,
    height: usize,
) -> CanvasImage {
    let mut image = CanvasImage::new(width, height);
    if rgb.len() != width * height {
        return image;
    }

    let mut cache: HashMap<u32, CanvasColor> = HashMap::new();
    for (out, &pixel) in image.pixels.iter_mut().zip(rgb) {
        *out = *cache
            .entry(pixel)
            .or_insert_with(|| palette.closest(pixel));
    }
    image
}

/// Scale a frame to the target size and quantize it
pub fn render_canvas(
    palette: &CanvasPalette,
    src: &[u32],
    src_width: usize,
    src_height: usize,
    target_width: usize,
    target_height: usize,
) -> CanvasImage {
    let scaled = scale_nearest(src, src_width, src_height, target_width, target_height);
    quantize(palette, &scaled, target_width, target_height)
}
