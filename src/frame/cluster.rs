//! Per-object cluster of associated lidar points and keypoint matches.

use crate::frame::types::{KeypointMatch, ObjectId};
use crate::geometry::PixelRect;
use crate::lidar::RangePoint;

/// A detected object together with the sensor data assigned to it.
///
/// The cluster stores indices into the owning [`Frame`](crate::frame::Frame)'s
/// arrays rather than copies, so the point and correspondence data stay
/// immutable once captured.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCluster {
    pub id: ObjectId,
    pub roi: PixelRect,
    /// Indices into the frame's `lidar_points`.
    pub lidar_indices: Vec<usize>,
    /// Indices into the frame's `keypoint_matches`.
    pub keypoint_match_indices: Vec<usize>,
}

impl ObjectCluster {
    pub fn new(id: ObjectId, roi: PixelRect) -> Self {
        Self {
            id,
            roi,
            lidar_indices: Vec::new(),
            keypoint_match_indices: Vec::new(),
        }
    }

    /// Gather the assigned lidar points from the frame arena.
    pub fn lidar_points(&self, arena: &[RangePoint]) -> Vec<RangePoint> {
        self.lidar_indices
            .iter()
            .filter_map(|&i| arena.get(i).copied())
            .collect()
    }

    /// Gather the assigned keypoint matches from the frame arena.
    pub fn keypoint_matches(&self, arena: &[KeypointMatch]) -> Vec<KeypointMatch> {
        self.keypoint_match_indices
            .iter()
            .filter_map(|&i| arena.get(i).copied())
            .collect()
    }
}
