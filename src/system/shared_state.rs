//! State shared between the pipeline worker and its callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::ttc::KinematicState;

/// Read-mostly view of the worker's progress.
///
/// Only the worker thread writes; everyone else reads.
#[derive(Default)]
pub struct SharedState {
    /// Kinematic state after the last processed frame.
    pub kinematics: RwLock<KinematicState>,

    /// Frames processed since the system started (across resets).
    pub frames_processed: AtomicUsize,

    /// TTC records produced since the system started.
    pub records_emitted: AtomicUsize,

    /// Request the worker to stop before draining its queue.
    pub shutdown_requested: AtomicBool,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinematic_snapshot(&self) -> KinematicState {
        *self.kinematics.read()
    }

    pub fn publish_kinematics(&self, state: KinematicState) {
        *self.kinematics.write() = state;
    }

    /// Record one processed frame and the number of records it produced.
    pub fn record_frame(&self, n_records: usize) {
        self.frames_processed.fetch_add(1, Ordering::SeqCst);
        self.records_emitted.fetch_add(n_records, Ordering::SeqCst);
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::SeqCst)
    }

    pub fn records_emitted(&self) -> usize {
        self.records_emitted.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}
