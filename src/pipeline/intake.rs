// Frame intake - the two producer styles
//
// `IndexedProducer` is driven pixel by pixel from an emulation loop and
// writes into its own live buffer without locking. `RawFrameSubmitter` is
// called from a native video callback and only copies the frame into the
// conversion queue. Both publish through the same frame store commit.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use flume::Sender;
use log::warn;

use crate::display::framebuffer::RGB_MASK;
use crate::display::{PaletteKind, PixelBuffer};

use super::queue::{DropReason, QueueMessage, RawFrame};
use super::store::FrameOrigin;
use super::Shared;

/// Receiver of a pixel stream produced one pixel at a time
pub trait IndexedPixelSink {
    /// Write `palette[index]` at the cursor and advance it
    fn push_indexed_pixel(&mut self, index: u8);

    /// Write an already expanded 0xRRGGBB color at the cursor and advance it
    fn push_color_pixel(&mut self, rgb: u32);

    /// Reset the cursor and publish the live buffer
    fn frame_complete(&mut self);

    fn enable(&mut self);

    fn disable(&mut self);
}

/// Receiver of whole RGB565 frames from a native callback
pub trait RawFrameSink {
    /// Queue a frame for conversion; never blocks and never fails
    ///
    /// Malformed frames are dropped and counted.
    fn submit_raw_frame(&self, bytes: Option<&[u8]>, width: usize, height: usize, stride: usize);
}

/// Pixel-stream producer with a private live buffer and write cursor
pub struct IndexedProducer {
    shared: Arc<Shared>,
    live: PixelBuffer,
    cursor: usize,
    palette: PaletteKind,
}

impl IndexedProducer {
    pub(crate) fn new(shared: Arc<Shared>, palette: PaletteKind) -> Self {
        let mut live = shared.store.copy_ready();
        live.clear(0);

        Self {
            shared,
            live,
            cursor: 0,
            palette,
        }
    }

    /// Next write position in the live buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn palette(&self) -> PaletteKind {
        self.palette
    }

    #[inline]
    fn write(&mut self, rgb: u32) {
        let pixels = self.live.as_mut_slice();
        pixels[self.cursor] = rgb;
        self.cursor = (self.cursor + 1) % pixels.len();
    }
}

impl IndexedPixelSink for IndexedProducer {
    fn push_indexed_pixel(&mut self, index: u8) {
        let rgb = self.palette.color(index);
        self.write(rgb);
    }

    fn push_color_pixel(&mut self, rgb: u32) {
        self.write(rgb & RGB_MASK);
    }

    fn frame_complete(&mut self) {
        self.cursor = 0;
        self.shared.publish(self.live.as_slice(), FrameOrigin::Indexed);
    }

    fn enable(&mut self) {
        self.shared.display_enabled.store(true, Ordering::Relaxed);
    }

    fn disable(&mut self) {
        self.shared.display_enabled.store(false, Ordering::Relaxed);
    }
}

/// Cloneable handle for the raw-frame path
#[derive(Clone)]
pub struct RawFrameSubmitter {
    shared: Arc<Shared>,
    queue: Sender<QueueMessage>,
}

impl RawFrameSubmitter {
    pub(crate) fn new(shared: Arc<Shared>, queue: Sender<QueueMessage>) -> Self {
        Self { shared, queue }
    }
}

impl RawFrameSink for RawFrameSubmitter {
    fn submit_raw_frame(&self, bytes: Option<&[u8]>, width: usize, height: usize, stride: usize) {
        enqueue_raw_frame(&self.shared, &self.queue, bytes, width, height, stride);
    }
}

/// Validate, copy and enqueue one raw frame
///
/// Submission numbers follow the order of successful validation; with a
/// single submitting thread that is also queue order. A frame refused by a
/// closed queue is counted as dropped only, not as submitted.
pub(crate) fn enqueue_raw_frame(
    shared: &Shared,
    queue: &Sender<QueueMessage>,
    bytes: Option<&[u8]>,
    width: usize,
    height: usize,
    stride: usize,
) {
    let result = RawFrame::new(bytes, width, height, stride, 0).and_then(|mut frame| {
        frame.set_submission(shared.stats.record_submitted());
        queue.send(QueueMessage::Frame(frame)).map_err(|_| {
            shared.stats.retract_submitted();
            DropReason::QueueClosed
        })
    });

    if let Err(reason) = result {
        shared.stats.record_dropped();
        warn!(
            "Dropped raw frame ({}x{}, stride {}): {}",
            width, height, stride, reason
        );
    }
}
