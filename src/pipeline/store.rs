// Frame store - the ready buffer and the single commit protocol
//
// Producers fill private live buffers and publish complete frames through
// `FrameStore::commit`, which copies into the ready buffer under one
// mutex. Readers copy the ready buffer out under the same mutex, so a
// reader never sees a partially written frame.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::display::PixelBuffer;

use super::PipelineError;

/// Which intake path produced a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameOrigin {
    /// Indexed / full-color pixel stream
    Indexed,
    /// Converted raw frame with its submission number
    Raw { submission: u64 },
}

/// A copy of the most recently published frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyFrame {
    /// Publication counter, starting at 1 for the first frame
    pub sequence: u64,
    pub origin: FrameOrigin,
    pub pixels: PixelBuffer,
}

/// Result of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Ready buffer replaced and a new notification raised
    Published,
    /// Ready buffer replaced; a notification was already pending
    Coalesced,
    /// Store sealed, frame discarded
    Rejected,
}

#[derive(Debug)]
struct StoreState {
    ready: PixelBuffer,
    sequence: u64,
    origin: Option<FrameOrigin>,
    notification_pending: bool,
    sealed: bool,
}

/// Double-buffer endpoint shared by producers, consumer and renderer
#[derive(Debug)]
pub struct FrameStore {
    state: Mutex<StoreState>,
    published: Condvar,
}

impl FrameStore {
    /// Create an empty store for the given resolution
    pub fn new(width: usize, height: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            state: Mutex::new(StoreState {
                ready: PixelBuffer::new(width, height)?,
                sequence: 0,
                origin: None,
                notification_pending: false,
                sealed: false,
            }),
            published: Condvar::new(),
        })
    }

    // A panic while holding the lock can only happen inside a slice copy,
    // which leaves whole pixels behind; the state stays usable.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a complete frame as the new ready frame
    ///
    /// # Panics
    /// Panics if `frame` does not match the store's resolution.
    pub fn commit(&self, frame: &[u32], origin: FrameOrigin) -> CommitOutcome {
        let mut state = self.lock();
        if state.sealed {
            return CommitOutcome::Rejected;
        }

        state.ready.copy_from_slice(frame);
        state.sequence += 1;
        state.origin = Some(origin);

        let outcome = if state.notification_pending {
            CommitOutcome::Coalesced
        } else {
            state.notification_pending = true;
            CommitOutcome::Published
        };
        drop(state);

        self.published.notify_all();
        outcome
    }

    /// Copy of the ready frame, or `None` before the first publish
    pub fn snapshot(&self) -> Option<ReadyFrame> {
        let state = self.lock();
        Self::ready_frame(&state)
    }

    fn ready_frame(state: &StoreState) -> Option<ReadyFrame> {
        state.origin.map(|origin| ReadyFrame {
            sequence: state.sequence,
            origin,
            pixels: state.ready.clone(),
        })
    }

    /// Copy the ready pixels out (black before the first publish)
    pub fn copy_ready(&self) -> PixelBuffer {
        self.lock().ready.clone()
    }

    /// Sequence number of the ready frame, 0 before the first publish
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    /// Consume the pending frame notification, if any
    pub fn take_notification(&self) -> bool {
        std::mem::take(&mut self.lock().notification_pending)
    }

    /// Block until a frame newer than `after_sequence` is published
    ///
    /// Returns `None` on timeout or once the store is sealed with nothing
    /// newer available.
    pub fn wait_for_frame(&self, after_sequence: u64, timeout: Duration) -> Option<ReadyFrame> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();

        loop {
            if state.sequence > after_sequence {
                return Self::ready_frame(&state);
            }
            if state.sealed {
                return None;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            state = self
                .published
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Refuse all further commits and wake any waiters
    pub fn seal(&self) {
        self.lock().sealed = true;
        self.published.notify_all();
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }
}
