// Conversion queue - raw frame records waiting for the consumer thread
//
// Producers copy native frame memory into an immutable `RawFrame` and
// append it to an unbounded FIFO channel. The consumer drains it in
// submission order.

use flume::{Receiver, Sender};
use std::fmt;

/// Why a raw frame submission was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No buffer, or an empty one
    MissingData,

    /// Width, height or stride is zero, so the frame has no pixels
    EmptyFrame {
        width: usize,
        height: usize,
        stride: usize,
    },

    /// `height * stride` exceeds the buffer length
    Truncated { needed: usize, available: usize },

    /// `height * stride` does not fit in `usize`
    SizeOverflow,

    /// The consumer has stopped and the queue no longer accepts frames
    QueueClosed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingData => write!(f, "missing frame data"),
            DropReason::EmptyFrame {
                width,
                height,
                stride,
            } => write!(
                f,
                "frame {}x{} with stride {} has no pixels",
                width, height, stride
            ),
            DropReason::Truncated { needed, available } => write!(
                f,
                "frame needs {} bytes but only {} were provided",
                needed, available
            ),
            DropReason::SizeOverflow => write!(f, "frame size overflows"),
            DropReason::QueueClosed => write!(f, "conversion queue closed"),
        }
    }
}

/// One submitted RGB565 frame awaiting conversion
///
/// Holds exactly `height * stride` bytes copied from the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Box<[u8]>,
    width: usize,
    height: usize,
    stride: usize,
    submission: u64,
}

impl RawFrame {
    /// Validate and copy a producer buffer
    ///
    /// # Errors
    /// Fails when the buffer is absent or empty, when any dimension is
    /// zero, or when it is shorter than `height * stride`.
    pub fn new(
        bytes: Option<&[u8]>,
        width: usize,
        height: usize,
        stride: usize,
        submission: u64,
    ) -> Result<Self, DropReason> {
        let bytes = match bytes {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(DropReason::MissingData),
        };
        if width == 0 || height == 0 || stride == 0 {
            return Err(DropReason::EmptyFrame {
                width,
                height,
                stride,
            });
        }

        let needed = height
            .checked_mul(stride)
            .ok_or(DropReason::SizeOverflow)?;
        if needed > bytes.len() {
            return Err(DropReason::Truncated {
                needed,
                available: bytes.len(),
            });
        }

        Ok(Self {
            bytes: bytes[..needed].into(),
            width,
            height,
            stride,
            submission,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row, padding included
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Submission number assigned at enqueue time
    pub fn submission(&self) -> u64 {
        self.submission
    }

    pub(crate) fn set_submission(&mut self, submission: u64) {
        self.submission = submission;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterate over the `height` rows, each exactly `stride` bytes
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| &self.bytes[y * self.stride..(y + 1) * self.stride])
    }
}

/// Messages carried by the conversion queue
#[derive(Debug)]
pub(crate) enum QueueMessage {
    /// A frame to convert
    Frame(RawFrame),
    /// Wakes an idle consumer so it re-checks its state
    Wake,
}

/// Create the unbounded conversion queue
pub(crate) fn conversion_queue() -> (Sender<QueueMessage>, Receiver<QueueMessage>) {
    flume::unbounded()
}
