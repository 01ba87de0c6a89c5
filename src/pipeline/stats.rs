// Diagnostic counters
//
// Lock-free counters updated from the producers and the consumer thread.
// Values are approximate snapshots; no ordering between counters is implied.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipelineStats {
    /// Raw frames accepted into the conversion queue
    pub frames_submitted: u64,
    /// Raw frames converted by the consumer
    pub frames_converted: u64,
    /// Raw frames dropped at intake (malformed, or queue closed)
    pub frames_dropped: u64,
    /// Frames copied into the ready buffer (both producer paths)
    pub frames_published: u64,
    /// Published frames that found a notification still pending
    pub swaps_coalesced: u64,
    /// Complete frames refused because the pipeline had stopped
    pub commits_rejected: u64,
    /// Conversions that panicked and were skipped
    pub conversion_faults: u64,
    /// Consumer loop iterations, idle wake-ups included
    pub loop_iterations: u64,
    /// Raw frames waiting in the queue
    pub queue_depth: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    frames_submitted: AtomicU64,
    frames_converted: AtomicU64,
    frames_dropped: AtomicU64,
    frames_published: AtomicU64,
    swaps_coalesced: AtomicU64,
    commits_rejected: AtomicU64,
    conversion_faults: AtomicU64,
    loop_iterations: AtomicU64,
}

impl Diagnostics {
    /// Count an accepted submission and return its submission number
    pub fn record_submitted(&self) -> u64 {
        self.frames_submitted.fetch_add(1, Ordering::Relaxed)
    }

    /// Undo `record_submitted` for a frame the queue refused
    pub fn retract_submitted(&self) {
        self.frames_submitted.fetch_sub(1, Ordering::Relaxed);
    }

    /// Count a converted frame and return the new total
    pub fn record_converted(&self) -> u64 {
        self.frames_converted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self, coalesced: bool) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
        if coalesced {
            self.swaps_coalesced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.commits_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.conversion_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_iteration(&self) {
        self.loop_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, queue_depth: usize) -> PipelineStats {
        PipelineStats {
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            frames_converted: self.frames_converted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            swaps_coalesced: self.swaps_coalesced.load(Ordering::Relaxed),
            commits_rejected: self.commits_rejected.load(Ordering::Relaxed),
            conversion_faults: self.conversion_faults.load(Ordering::Relaxed),
            loop_iterations: self.loop_iterations.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}
