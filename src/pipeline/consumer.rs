// Consumer loop - converts queued raw frames off the producer's thread
//
// Lifecycle: Starting -> Running -> Stopping -> Stopped. The thread blocks
// on the queue with a bounded timeout instead of sleeping, and re-checks
// its state once per iteration. A stop request is honoured at the next
// iteration boundary, so at most one in-flight conversion finishes first.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError};
use log::{debug, error, info, trace};

use crate::display::{convert_raw_frame, PixelBuffer};

use super::queue::{QueueMessage, RawFrame};
use super::store::FrameOrigin;
use super::Shared;

/// Consumer thread lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConsumerState {
    Starting = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl ConsumerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConsumerState::Starting,
            1 => ConsumerState::Running,
            2 => ConsumerState::Stopping,
            _ => ConsumerState::Stopped,
        }
    }
}

/// Atomically shared `ConsumerState`
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        StateCell(AtomicU8::new(ConsumerState::Starting as u8))
    }

    pub fn get(&self) -> ConsumerState {
        ConsumerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConsumerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move `from` -> `to`; false if the state was something else
    pub fn transition(&self, from: ConsumerState, to: ConsumerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Ask a starting or running consumer to stop
    pub fn request_stop(&self) {
        if !self.transition(ConsumerState::Running, ConsumerState::Stopping) {
            self.transition(ConsumerState::Starting, ConsumerState::Stopping);
        }
    }
}

/// Tunables for the consumer loop
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsumerSettings {
    /// Longest single wait on an empty queue
    pub idle_wait: Duration,
    /// Converted frames between progress log lines (0 = never)
    pub progress_log_interval: u64,
}

/// Spawn the consumer thread
///
/// `live` is the consumer's private conversion buffer.
pub(crate) fn spawn(
    shared: Arc<Shared>,
    queue: Receiver<QueueMessage>,
    live: PixelBuffer,
    settings: ConsumerSettings,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("frame-consumer".to_string())
        .spawn(move || run(&shared, &queue, live, settings))
}

fn run(
    shared: &Shared,
    queue: &Receiver<QueueMessage>,
    mut live: PixelBuffer,
    settings: ConsumerSettings,
) {
    if shared
        .consumer_state
        .transition(ConsumerState::Starting, ConsumerState::Running)
    {
        info!("Frame consumer started");
    }

    while shared.consumer_state.get() == ConsumerState::Running {
        shared.stats.record_iteration();

        match queue.recv_timeout(settings.idle_wait) {
            Ok(QueueMessage::Frame(frame)) => {
                if shared.consumer_state.get() != ConsumerState::Running {
                    break;
                }
                process_frame(shared, &frame, &mut live, settings);
            }
            Ok(QueueMessage::Wake) => {}
            Err(RecvTimeoutError::Timeout) => trace!("Frame consumer idle"),
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Conversion queue disconnected");
                break;
            }
        }
    }

    shared.consumer_state.set(ConsumerState::Stopped);
    info!(
        "Frame consumer stopped after {} frames",
        shared.stats.snapshot(queue.len()).frames_converted
    );
}

fn process_frame(
    shared: &Shared,
    frame: &RawFrame,
    live: &mut PixelBuffer,
    settings: ConsumerSettings,
) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let report = convert_raw_frame(frame, live.as_mut_slice());
        if report.skipped > 0 {
            debug!(
                "Frame {}: skipped {} samples past row end",
                frame.submission(),
                report.skipped
            );
        }
        shared.publish(
            live.as_slice(),
            FrameOrigin::Raw {
                submission: frame.submission(),
            },
        );
    }));

    match result {
        Ok(()) => {
            let converted = shared.stats.record_converted();
            let interval = settings.progress_log_interval;
            if interval > 0 && converted % interval == 0 {
                info!("Converted and published {} frames", converted);
            }
        }
        Err(payload) => {
            shared.stats.record_fault();
            error!(
                "Error converting frame {}: {}",
                frame.submission(),
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
