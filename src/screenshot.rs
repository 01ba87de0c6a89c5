// Screenshot functionality
//
// Saves the ready frame, or a rendered canvas image expanded back through
// the canvas palette, as a PNG file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::display::{CanvasImage, CanvasPalette, PixelBuffer};

/// Errors that can occur during screenshot operations
#[derive(Debug)]
pub enum ScreenshotError {
    /// I/O error
    Io(io::Error),

    /// PNG encoding error
    PngEncoding(png::EncodingError),

    /// Image has a zero dimension
    EmptyImage,
}

impl std::fmt::Display for ScreenshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenshotError::Io(e) => write!(f, "I/O error: {}", e),
            ScreenshotError::PngEncoding(e) => write!(f, "PNG encoding error: {}", e),
            ScreenshotError::EmptyImage => write!(f, "Image has no pixels"),
        }
    }
}

impl std::error::Error for ScreenshotError {}

impl From<io::Error> for ScreenshotError {
    fn from(e: io::Error) -> Self {
        ScreenshotError::Io(e)
    }
}

impl From<png::EncodingError> for ScreenshotError {
    fn from(e: png::EncodingError) -> Self {
        ScreenshotError::PngEncoding(e)
    }
}

/// Save a pixel buffer (usually the ready frame) as PNG
///
/// # Returns
///
/// Path of the written file
///
/// # Example
///
/// ```no_run
/// use retro_canvas::config::PipelineConfig;
/// use retro_canvas::pipeline::FramePipeline;
/// use retro_canvas::screenshot::save_frame_png;
/// use std::path::Path;
///
/// let pipeline = FramePipeline::new(&PipelineConfig::default()).unwrap();
/// if let Some(frame) = pipeline.ready_frame() {
///     let path = save_frame_png(&frame.pixels, Path::new("screenshots"), true).unwrap();
///     println!("Screenshot saved to: {}", path.display());
/// }
/// ```
pub fn save_frame_png(
    frame: &PixelBuffer,
    directory: &Path,
    include_timestamp: bool,
) -> Result<PathBuf, ScreenshotError> {
    let path = prepare_path(directory, "frame", include_timestamp)?;
    save_png(&path, &frame.to_rgb_bytes(), frame.width(), frame.height())?;
    Ok(path)
}

/// Save a rendered canvas image as PNG
///
/// Transparent canvas pixels are written as black.
pub fn save_canvas_png(
    image: &CanvasImage,
    palette: &CanvasPalette,
    directory: &Path,
    include_timestamp: bool,
) -> Result<PathBuf, ScreenshotError> {
    let path = prepare_path(directory, "canvas", include_timestamp)?;
    save_png(
        &path,
        &canvas_to_rgb(image, palette),
        image.width(),
        image.height(),
    )?;
    Ok(path)
}

/// Create the directory and build the output file name
fn prepare_path(
    directory: &Path,
    prefix: &str,
    include_timestamp: bool,
) -> Result<PathBuf, ScreenshotError> {
    fs::create_dir_all(directory)?;

    let filename = if include_timestamp {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("{}_{}.png", prefix, timestamp)
    } else {
        format!("{}.png", prefix)
    };
    Ok(directory.join(filename))
}

/// Convert canvas colors to RGB888 bytes
fn canvas_to_rgb(image: &CanvasImage, palette: &CanvasPalette) -> Vec<u8> {
    let mut rgb_data = Vec::with_capacity(image.as_slice().len() * 3);

    for &color in image.as_slice() {
        let rgb = palette.rgb(color).unwrap_or(0);
        rgb_data.push(((rgb >> 16) & 0xFF) as u8); // R
        rgb_data.push(((rgb >> 8) & 0xFF) as u8); // G
        rgb_data.push((rgb & 0xFF) as u8); // B
    }

    rgb_data
}

/// Save RGB data as a PNG file
fn save_png(path: &Path, data: &[u8], width: usize, height: usize) -> Result<(), ScreenshotError> {
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ScreenshotError::EmptyImage),
    };

    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;

    Ok(())
}
