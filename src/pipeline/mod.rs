// Pipeline module - frame ingestion, conversion and double buffering
//
// This module provides:
// - Two intake paths: a per-pixel indexed stream and queued raw RGB565 frames
// - A background consumer thread that converts raw frames in FIFO order
// - A mutex-guarded ready frame that readers copy out, never torn
// - On-demand rendering of the ready frame into canvas colors

mod consumer;
mod intake;
mod queue;
mod stats;
mod store;

pub use consumer::ConsumerState;
pub use intake::{IndexedPixelSink, IndexedProducer, RawFrameSink, RawFrameSubmitter};
pub use queue::{DropReason, RawFrame};
pub use stats::PipelineStats;
pub use store::{CommitOutcome, FrameOrigin, FrameStore, ReadyFrame};

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use flume::Sender;
use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::display::{render_canvas, CanvasImage, CanvasPalette, PaletteKind};

use consumer::{ConsumerSettings, StateCell};
use queue::QueueMessage;
use stats::Diagnostics;

/// Errors raised while building a pipeline
///
/// All of these are configuration problems; a running pipeline never
/// returns errors.
#[derive(Debug)]
pub enum PipelineError {
    /// Display resolution with a zero dimension
    InvalidResolution { width: usize, height: usize },

    /// Other invalid configuration value
    InvalidConfig(String),

    /// Pixel data does not match the configured resolution
    BufferLengthMismatch { expected: usize, found: usize },

    /// The consumer thread could not be started
    Spawn(io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidResolution { width, height } => {
                write!(f, "Invalid display resolution {}x{}", width, height)
            }
            PipelineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PipelineError::BufferLengthMismatch { expected, found } => write!(
                f,
                "Buffer length mismatch: expected {}, found {}",
                expected, found
            ),
            PipelineError::Spawn(e) => write!(f, "Failed to spawn consumer thread: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<io::Error> for PipelineError {
    fn from(e: io::Error) -> Self {
        PipelineError::Spawn(e)
    }
}

/// State shared by the pipeline handle, producers and the consumer thread
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) store: FrameStore,
    pub(crate) stats: Diagnostics,
    pub(crate) consumer_state: StateCell,
    /// Tracked from the pixel stream; rendering does not consult it
    pub(crate) display_enabled: AtomicBool,
}

impl Shared {
    pub(crate) fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            store: FrameStore::new(config.display.width, config.display.height)?,
            stats: Diagnostics::default(),
            consumer_state: StateCell::new(),
            display_enabled: AtomicBool::new(true),
        })
    }

    /// The one commit path used by every producer
    pub(crate) fn publish(&self, frame: &[u32], origin: FrameOrigin) -> CommitOutcome {
        let outcome = self.store.commit(frame, origin);
        match outcome {
            CommitOutcome::Published => self.stats.record_published(false),
            CommitOutcome::Coalesced => {
                self.stats.record_published(true);
                debug!("Frame {:?} coalesced into pending swap", origin);
            }
            CommitOutcome::Rejected => {
                self.stats.record_rejected();
                warn!("Frame {:?} rejected: pipeline stopped", origin);
            }
        }
        outcome
    }
}

/// Frame pipeline: intake, conversion thread, ready frame and renderer
///
/// Created with a fixed resolution and LCD palette. The consumer thread is
/// started on construction and halted by [`FramePipeline::stop`] or on drop.
///
/// ```no_run
/// use retro_canvas::config::PipelineConfig;
/// use retro_canvas::pipeline::{FramePipeline, IndexedPixelSink, RawFrameSink};
///
/// let pipeline = FramePipeline::new(&PipelineConfig::default()).unwrap();
///
/// let mut lcd = pipeline.indexed_producer();
/// for _ in 0..160 * 144 {
///     lcd.push_indexed_pixel(1);
/// }
/// lcd.frame_complete();
///
/// pipeline.submit_raw_frame(Some(&[0u8; 160 * 144 * 2][..]), 160, 144, 320);
///
/// let image = pipeline.render(128, 128);
/// assert_eq!(image.width(), 128);
/// pipeline.stop();
/// ```
pub struct FramePipeline {
    shared: Arc<Shared>,
    queue: Sender<QueueMessage>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    palette: PaletteKind,
    canvas_palette: CanvasPalette,
    width: usize,
    height: usize,
}

impl FramePipeline {
    /// Build a pipeline and start its consumer thread
    ///
    /// # Errors
    /// Fails on invalid configuration or if the thread cannot be spawned.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let shared = Arc::new(Shared::new(config)?);
        let live = shared.store.copy_ready();
        let (tx, rx) = queue::conversion_queue();

        let settings = ConsumerSettings {
            idle_wait: Duration::from_millis(config.consumer.idle_wait_ms),
            progress_log_interval: config.consumer.progress_log_interval,
        };
        let handle = consumer::spawn(Arc::clone(&shared), rx, live, settings)?;

        info!(
            "Frame pipeline created: {}x{}, {:?} palette",
            config.display.width, config.display.height, config.display.palette
        );

        Ok(Self {
            shared,
            queue: tx,
            consumer: Mutex::new(Some(handle)),
            palette: config.display.palette,
            canvas_palette: CanvasPalette::new(),
            width: config.display.width,
            height: config.display.height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn palette(&self) -> PaletteKind {
        self.palette
    }

    pub fn canvas_palette(&self) -> &CanvasPalette {
        &self.canvas_palette
    }

    /// Create a producer for the indexed pixel stream
    pub fn indexed_producer(&self) -> IndexedProducer {
        IndexedProducer::new(Arc::clone(&self.shared), self.palette)
    }

    /// Create a cloneable handle for the raw-frame callback
    pub fn raw_submitter(&self) -> RawFrameSubmitter {
        RawFrameSubmitter::new(Arc::clone(&self.shared), self.queue.clone())
    }

    /// Scale the ready frame to `width x height` and quantize it
    ///
    /// The ready buffer is copied out under the store lock; scaling and
    /// quantization run after the lock is released.
    pub fn render(&self, width: usize, height: usize) -> CanvasImage {
        let frame = self.shared.store.copy_ready();
        render_canvas(
            &self.canvas_palette,
            frame.as_slice(),
            frame.width(),
            frame.height(),
            width,
            height,
        )
    }

    /// Copy of the most recent complete frame, `None` before the first
    pub fn ready_frame(&self) -> Option<ReadyFrame> {
        self.shared.store.snapshot()
    }

    /// Wait up to `timeout` for a frame newer than `after_sequence`
    pub fn wait_for_frame(&self, after_sequence: u64, timeout: Duration) -> Option<ReadyFrame> {
        self.shared.store.wait_for_frame(after_sequence, timeout)
    }

    /// Consume the pending new-frame notification
    ///
    /// At most one notification is pending at a time; frames published
    /// while one is pending are coalesced into it.
    pub fn take_frame_notification(&self) -> bool {
        self.shared.store.take_notification()
    }

    /// Last enable/disable signal from the pixel stream
    pub fn is_display_enabled(&self) -> bool {
        self.shared.display_enabled.load(Ordering::Relaxed)
    }

    pub fn consumer_state(&self) -> ConsumerState {
        self.shared.consumer_state.get()
    }

    /// Snapshot of the diagnostic counters
    pub fn stats(&self) -> PipelineStats {
        self.shared.stats.snapshot(self.queue.len())
    }

    /// Halt the consumer thread and seal the ready frame
    ///
    /// Blocks until the thread has exited and the store is sealed. Queued
    /// frames not yet taken by the consumer are discarded. Concurrent
    /// callers wait for the first one to finish; later calls are no-ops.
    pub fn stop(&self) {
        // Held until the store is sealed
        let mut consumer = self
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = consumer.take() else {
            return;
        };

        self.shared.consumer_state.request_stop();
        // Wake the consumer if it is waiting on an empty queue
        let _ = self.queue.send(QueueMessage::Wake);

        if handle.join().is_err() {
            warn!("Frame consumer thread panicked");
        }
        self.shared.consumer_state.set(ConsumerState::Stopped);
        self.shared.store.seal();

        drop(consumer);

        let stats = self.stats();
        info!(
            "Frame pipeline stopped: {} converted, {} dropped",
            stats.frames_converted, stats.frames_dropped
        );
    }
}

impl RawFrameSink for FramePipeline {
    fn submit_raw_frame(&self, bytes: Option<&[u8]>, width: usize, height: usize, stride: usize) {
        intake::enqueue_raw_frame(&self.shared, &self.queue, bytes, width, height, stride);
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
