// Display module - Pixel storage, color conversion and canvas rendering
//
// This module provides:
// - Fixed-resolution 24-bit pixel buffers
// - LCD palettes (standard and grayscale) and the canvas surface palette
// - RGB565 to RGB888 conversion for raw frames
// - Nearest-neighbour scaling and palette quantization for the canvas

pub mod canvas;
pub mod convert;
pub mod framebuffer;
pub mod palette;

pub use canvas::{quantize, render_canvas, scale_nearest, CanvasImage};
pub use convert::{convert_raw_frame, expand_rgb565, ConversionReport};
pub use framebuffer::{PixelBuffer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use palette::{CanvasColor, CanvasPalette, PaletteKind};
