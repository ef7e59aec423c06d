//! Messages exchanged with the pipeline worker.

use crate::frame::Frame;
use crate::pipeline::TtcRecord;
use crate::ttc::KinematicState;

/// Input to the worker thread.
pub enum WorkerMsg {
    /// Process the next frame of the current run.
    Frame(Box<Frame>),
    /// Drop the previous frame and kinematic state before a new run.
    Reset,
}

/// Output of the worker thread for one processed frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub frame_index: usize,
    /// One record per matched object pair, in ascending previous-id order.
    /// Empty for the first frame of a run.
    pub records: Vec<TtcRecord>,
    /// Kinematic state after the frame.
    pub state: KinematicState,
}
