// Common test utilities for pipeline integration tests
//
// Builders for small pipelines and synthetic RGB565 frames shared by the
// intake, ordering and concurrency suites.

#![allow(dead_code)]

use retro_canvas::config::PipelineConfig;
use retro_canvas::pipeline::FramePipeline;
use std::time::{Duration, Instant};

/// Upper bound for anything a test waits on
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration with a small resolution and a fast idle wait
pub fn test_config(width: usize, height: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.display.width = width;
    config.display.height = height;
    config.consumer.idle_wait_ms = 1;
    config.consumer.progress_log_interval = 0;
    config
}

/// Build and start a pipeline for tests
pub fn test_pipeline(width: usize, height: usize) -> FramePipeline {
    FramePipeline::new(&test_config(width, height)).expect("Failed to create pipeline")
}

/// Pack 5-6-5 components into one sample
pub fn rgb565(r5: u16, g6: u16, b5: u16) -> u16 {
    ((r5 & 0x1F) << 11) | ((g6 & 0x3F) << 5) | (b5 & 0x1F)
}

/// A frame where every pixel is `sample`, rows padded to `stride` with 0xEE
pub fn solid_frame(width: usize, height: usize, stride: usize, sample: u16) -> Vec<u8> {
    assert!(stride >= width * 2, "stride too small for solid frame");

    let mut bytes = vec![0xEE; height * stride];
    for y in 0..height {
        for x in 0..width {
            let offset = y * stride + x * 2;
            bytes[offset..offset + 2].copy_from_slice(&sample.to_le_bytes());
        }
    }
    bytes
}

/// Poll until the consumer has converted at least `count` frames
pub fn wait_for_converted(pipeline: &FramePipeline, count: u64) -> bool {
    let deadline = Instant::now() + TEST_TIMEOUT;
    while Instant::now() < deadline {
        if pipeline.stats().frames_converted >= count {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}
