// Color conversion - RGB565 raw frames to packed 24-bit RGB
//
// Native cores hand over frames as rows of little-endian 16-bit samples
// laid out 5-6-5 (red in the high bits). Each channel is widened to 8 bits
// by bit replication so that full intensity maps to 0xFF exactly.

use crate::pipeline::RawFrame;

/// Bytes per RGB565 sample
pub const BYTES_PER_PIXEL: usize = 2;

/// Expand one RGB565 sample to packed 0xRRGGBB
///
/// ```
/// use retro_canvas::display::expand_rgb565;
///
/// assert_eq!(expand_rgb565(0xF800), 0xFF0000);
/// assert_eq!(expand_rgb565(0x07E0), 0x00FF00);
/// assert_eq!(expand_rgb565(0x001F), 0x0000FF);
/// ```
#[inline]
pub fn expand_rgb565(sample: u16) -> u32 {
    let r5 = ((sample >> 11) & 0x1F) as u32;
    let g6 = ((sample >> 5) & 0x3F) as u32;
    let b5 = (sample & 0x1F) as u32;

    let r8 = (r5 << 3) | (r5 >> 2);
    let g8 = (g6 << 2) | (g6 >> 4);
    let b8 = (b5 << 3) | (b5 >> 2);

    (r8 << 16) | (g8 << 8) | b8
}

/// Outcome of converting one raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionReport {
    /// Pixels written into the destination
    pub written: usize,
    /// Samples skipped because they ran past the row's bytes
    pub skipped: usize,
}

/// Convert a raw RGB565 frame into `dest`, row-major
///
/// Pixel `(x, y)` lands at `y * width + x`. Bytes past `width * 2` in each
/// row are padding. A sample that would read past the end of its row is
/// skipped and that position keeps its previous value; positions past the
/// end of `dest` are ignored.
pub fn convert_raw_frame(frame: &RawFrame, dest: &mut [u32]) -> ConversionReport {
    let mut report = ConversionReport::default();
    let width = frame.width();
    let stride = frame.stride();

    for (y, row) in frame.rows().enumerate() {
        for x in 0..width {
            let position = y * width + x;
            if position >= dest.len() {
                return report;
            }

            let byte_pos = x * BYTES_PER_PIXEL;
            if byte_pos + 1 >= stride {
                report.skipped += 1;
                continue;
            }

            let sample = u16::from_le_bytes([row[byte_pos], row[byte_pos + 1]]);
            dest[position] = expand_rgb565(sample);
            report.written += 1;
        }
    }

    report
}
