//! Per-pair output row.

use serde::Serialize;

use crate::frame::ObjectId;
use crate::ttc::Ttc;

/// Both TTC estimates for one matched object pair in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TtcRecord {
    /// Index of the current frame.
    pub frame_index: usize,
    pub prev_object_id: ObjectId,
    pub curr_object_id: ObjectId,
    pub lidar_ttc: Ttc,
    pub camera_ttc: Ttc,
    /// Lidar points associated with the object in the previous frame.
    pub lidar_points_prev: usize,
    /// Lidar points associated with the object in the current frame.
    pub lidar_points_curr: usize,
    /// Keypoint correspondences kept by the ROI filter.
    pub keypoint_matches: usize,
}

impl std::fmt::Display for TtcRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame {} {} -> {}: lidar {} ({}/{} pts), camera {} ({} matches)",
            self.frame_index,
            self.prev_object_id,
            self.curr_object_id,
            self.lidar_ttc,
            self.lidar_points_prev,
            self.lidar_points_curr,
            self.camera_ttc,
            self.keypoint_matches
        )
    }
}
