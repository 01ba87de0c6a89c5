// Retro Canvas - Demo Host
//
// Drives the frame pipeline with synthetic producers: one indexed-pixel
// frame from an LCD-style stream, then a run of RGB565 frames through the
// raw-frame path. Renders the result for a canvas and saves screenshots.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use retro_canvas::config::{PipelineConfig, CONFIG_FILE};
use retro_canvas::pipeline::{FramePipeline, IndexedPixelSink, RawFrameSink};
use retro_canvas::screenshot::{save_canvas_png, save_frame_png};

/// Canvas size used for the demo render (one 128x128 map)
const CANVAS_SIZE: usize = 128;

/// Number of synthetic raw frames to push
const RAW_FRAMES: u16 = 120;

/// Build an RGB565 frame with a diagonal gradient that shifts with `tick`
fn gradient_frame(width: usize, height: usize, stride: usize, tick: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; height * stride];
    for y in 0..height {
        for x in 0..width {
            let r5 = ((x * 32 / width) as u16 + tick) & 0x1F;
            let g6 = (y * 64 / height) as u16 & 0x3F;
            let b5 = (tick >> 2) & 0x1F;
            let sample = (r5 << 11) | (g6 << 5) | b5;

            let offset = y * stride + x * 2;
            bytes[offset..offset + 2].copy_from_slice(&sample.to_le_bytes());
        }
    }
    bytes
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Retro Canvas v0.1.0");
    println!("===================");
    println!();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = PipelineConfig::load_or_default(&config_path);
    println!("Configuration loaded from '{}'", config_path.display());
    println!(
        "Display: {}x{}, {:?} palette",
        config.display.width, config.display.height, config.display.palette
    );
    println!();

    let pipeline = FramePipeline::new(&config)?;
    let width = pipeline.width();
    let height = pipeline.height();

    // Indexed path: vertical bands of the four LCD shades
    println!("Indexed pixel stream");
    println!("--------------------");
    let mut lcd = pipeline.indexed_producer();
    lcd.enable();
    for _ in 0..height {
        for x in 0..width {
            lcd.push_indexed_pixel((x * 4 / width) as u8);
        }
    }
    lcd.frame_complete();
    if let Some(frame) = pipeline.ready_frame() {
        println!("Published frame #{} from {:?}", frame.sequence, frame.origin);
    }
    println!();

    // Raw path: padded rows, as a native core would hand them over
    println!("Raw RGB565 frames");
    println!("-----------------");
    let stride = width * 2 + 16;
    let submitter = pipeline.raw_submitter();
    for tick in 0..RAW_FRAMES {
        let frame = gradient_frame(width, height, stride, tick);
        submitter.submit_raw_frame(Some(&frame[..]), width, height, stride);
    }
    // One malformed frame to show the drop counter
    submitter.submit_raw_frame(Some(&[0u8; 16][..]), width, height, stride);

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut last_sequence = 0;
    while pipeline.stats().frames_converted < u64::from(RAW_FRAMES) && Instant::now() < deadline {
        if let Some(frame) = pipeline.wait_for_frame(last_sequence, Duration::from_millis(50)) {
            last_sequence = frame.sequence;
        }
    }
    println!("Converted {} frames", pipeline.stats().frames_converted);
    println!();

    // Render for the canvas and save both views
    let image = pipeline.render(CANVAS_SIZE, CANVAS_SIZE);
    let directory = &config.screenshot.directory;
    let timestamp = config.screenshot.include_timestamp;

    if let Some(frame) = pipeline.ready_frame() {
        let path = save_frame_png(&frame.pixels, directory, timestamp)?;
        println!("Ready frame saved to: {}", path.display());
    }
    let path = save_canvas_png(&image, pipeline.canvas_palette(), directory, timestamp)?;
    println!("Canvas render saved to: {}", path.display());
    println!();

    pipeline.stop();

    println!("Diagnostics");
    println!("-----------");
    println!("{}", serde_json::to_string_pretty(&pipeline.stats())?);

    Ok(())
}
