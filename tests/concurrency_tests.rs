// Concurrency tests for the frame pipeline
//
// Both producers, a raw submitter thread and render readers run at the same
// time. Every frame pushed is a single uniform color, so any mixed frame
// seen by a reader means a swap or copy tore.

mod common;

use common::{rgb565, solid_frame, test_pipeline, wait_for_converted, TEST_TIMEOUT};
use retro_canvas::pipeline::{ConsumerState, FrameOrigin};
use retro_canvas::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WIDTH: usize = 32;
const HEIGHT: usize = 24;

/// RGB colors a uniform frame from either producer may carry
fn allowed_colors() -> HashSet<u32> {
    let mut colors: HashSet<u32> = PaletteKind::Standard.colors().iter().copied().collect();
    for sample in raw_samples() {
        colors.insert(expand_rgb565(sample));
    }
    // Initial ready buffer
    colors.insert(0);
    colors
}

fn raw_samples() -> [u16; 4] {
    [
        rgb565(31, 0, 0),
        rgb565(0, 63, 0),
        rgb565(0, 0, 31),
        rgb565(16, 32, 16),
    ]
}

fn is_uniform(pixels: &[u32]) -> bool {
    pixels.windows(2).all(|pair| pair[0] == pair[1])
}

#[test]
fn test_ready_frame_never_torn() {
    let pipeline = Arc::new(test_pipeline(WIDTH, HEIGHT));
    let running = Arc::new(AtomicBool::new(true));
    let allowed = allowed_colors();

    let mut lcd = pipeline.indexed_producer();
    let indexed_running = Arc::clone(&running);
    let indexed = thread::spawn(move || {
        let mut frames = 0u64;
        while indexed_running.load(Ordering::Relaxed) {
            let index = (frames % 4) as u8;
            for _ in 0..WIDTH * HEIGHT {
                lcd.push_indexed_pixel(index);
            }
            lcd.frame_complete();
            frames += 1;
        }
        frames
    });

    let submitter = pipeline.raw_submitter();
    let raw_running = Arc::clone(&running);
    let raw = thread::spawn(move || {
        let frames: Vec<Vec<u8>> = raw_samples()
            .iter()
            .map(|&sample| solid_frame(WIDTH, HEIGHT, WIDTH * 2 + 8, sample))
            .collect();
        let mut submitted = 0usize;
        while raw_running.load(Ordering::Relaxed) {
            let frame = &frames[submitted % frames.len()];
            submitter.submit_raw_frame(Some(&frame[..]), WIDTH, HEIGHT, WIDTH * 2 + 8);
            submitted += 1;
            thread::sleep(Duration::from_micros(200));
        }
        submitted
    });

    let deadline = Instant::now() + Duration::from_millis(300);
    let mut checked = 0;
    while Instant::now() < deadline {
        if let Some(ready) = pipeline.ready_frame() {
            let pixels = ready.pixels.as_slice();
            assert_eq!(pixels.len(), WIDTH * HEIGHT);
            assert!(is_uniform(pixels), "torn frame from {:?}", ready.origin);
            assert!(allowed.contains(&pixels[0]));
        }

        let image = pipeline.render(16, 16);
        assert_eq!(image.as_slice().len(), 16 * 16);
        assert!(is_uniform_canvas(&image));
        checked += 1;
    }

    running.store(false, Ordering::Relaxed);
    let indexed_frames = indexed.join().unwrap();
    let raw_frames = raw.join().unwrap();
    pipeline.stop();

    assert!(checked > 0);
    assert!(indexed_frames > 0);
    assert!(raw_frames > 0);
}

fn is_uniform_canvas(image: &CanvasImage) -> bool {
    image.as_slice().windows(2).all(|pair| pair[0] == pair[1])
}

#[test]
fn test_concurrent_renders_agree_with_ready_frame_size() {
    let pipeline = Arc::new(test_pipeline(WIDTH, HEIGHT));
    let frame = solid_frame(WIDTH, HEIGHT, WIDTH * 2, rgb565(31, 63, 31));
    pipeline.submit_raw_frame(Some(&frame[..]), WIDTH, HEIGHT, WIDTH * 2);
    assert!(wait_for_converted(&pipeline, 1));

    let readers: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                let size = 8 * (i + 1);
                for _ in 0..50 {
                    let image = pipeline.render(size, size);
                    assert_eq!((image.width(), image.height()), (size, size));
                    assert!(is_uniform_canvas(&image));
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }

    let white = pipeline.canvas_palette().closest(0xFFFFFF);
    assert!(pipeline.render(4, 4).as_slice().iter().all(|&c| c == white));
}

#[test]
fn test_multiple_submitters_keep_per_thread_order() {
    let pipeline = Arc::new(test_pipeline(1, 1));
    let frames_per_thread = 100u16;

    // Thread t submits samples with the top bits set to t; per thread the
    // low bits count up
    let submitters: Vec<_> = (0..2u16)
        .map(|t| {
            let submitter = pipeline.raw_submitter();
            thread::spawn(move || {
                for n in 0..frames_per_thread {
                    let sample = (t << 15) | n;
                    submitter.submit_raw_frame(Some(&sample.to_le_bytes()[..]), 1, 1, 2);
                }
            })
        })
        .collect();

    let mut last_seen = [None::<u16>; 2];
    let mut sequence = 0;
    let total = u64::from(frames_per_thread) * 2;
    let deadline = Instant::now() + TEST_TIMEOUT;
    while pipeline.stats().frames_converted < total && Instant::now() < deadline {
        let Some(ready) = pipeline.wait_for_frame(sequence, Duration::from_millis(20)) else {
            continue;
        };
        sequence = ready.sequence;

        // Invert the expansion: r5 top bit tells the thread, low bits count
        let rgb = ready.pixels.as_slice()[0];
        let r5 = (rgb >> 19) & 0x1F;
        let g6 = (rgb >> 10) & 0x3F;
        let b5 = (rgb >> 3) & 0x1F;
        let sample = ((r5 << 11) | (g6 << 5) | b5) as u16;

        let thread_id = usize::from(sample >> 15);
        let count = sample & 0x7FFF;
        if let Some(previous) = last_seen[thread_id] {
            assert!(count > previous, "thread {} went backwards", thread_id);
        }
        last_seen[thread_id] = Some(count);
    }

    for submitter in submitters {
        submitter.join().unwrap();
    }
    assert!(wait_for_converted(&pipeline, total));
    assert_eq!(pipeline.stats().frames_submitted, total);
}

#[test]
fn test_stop_while_producers_run() {
    let pipeline = Arc::new(test_pipeline(WIDTH, HEIGHT));
    let running = Arc::new(AtomicBool::new(true));

    let submitter = pipeline.raw_submitter();
    let raw_running = Arc::clone(&running);
    let frame = solid_frame(WIDTH, HEIGHT, WIDTH * 2, rgb565(0, 0, 31));
    let raw = thread::spawn(move || {
        while raw_running.load(Ordering::Relaxed) {
            submitter.submit_raw_frame(Some(&frame[..]), WIDTH, HEIGHT, WIDTH * 2);
            thread::sleep(Duration::from_micros(100));
        }
    });

    let mut lcd = pipeline.indexed_producer();
    let indexed_running = Arc::clone(&running);
    let indexed = thread::spawn(move || {
        while indexed_running.load(Ordering::Relaxed) {
            lcd.push_indexed_pixel(1);
            lcd.frame_complete();
            thread::yield_now();
        }
    });

    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    pipeline.stop();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(pipeline.consumer_state(), ConsumerState::Stopped);

    // Nothing may land once stop has returned
    let sealed = pipeline.ready_frame();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(pipeline.ready_frame(), sealed);

    running.store(false, Ordering::Relaxed);
    raw.join().unwrap();
    indexed.join().unwrap();

    let stats = pipeline.stats();
    assert!(stats.frames_dropped > 0);
    assert_eq!(pipeline.ready_frame(), sealed);
    if let Some(frame) = sealed {
        assert!(matches!(
            frame.origin,
            FrameOrigin::Indexed | FrameOrigin::Raw { .. }
        ));
    }
}

#[test]
fn test_concurrent_stops_both_wait_for_halt() {
    let pipeline = Arc::new(test_pipeline(1024, 1024));
    let frame = solid_frame(1024, 1024, 2048, rgb565(31, 0, 0));
    for _ in 0..3 {
        pipeline.submit_raw_frame(Some(&frame[..]), 1024, 1024, 2048);
    }

    let first = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || pipeline.stop())
    };
    thread::sleep(Duration::from_millis(2));

    pipeline.stop();
    assert_eq!(pipeline.consumer_state(), ConsumerState::Stopped);
    let published = pipeline.stats().frames_published;
    let sealed = pipeline.ready_frame();

    first.join().unwrap();
    assert_eq!(pipeline.stats().frames_published, published);
    assert_eq!(pipeline.ready_frame(), sealed);
}
