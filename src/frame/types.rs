//! Core ID and correspondence types for per-frame data.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Identifier of a detected object within a single frame.
///
/// ObjectIds come from the detector and are only meaningful inside the frame
/// that produced them; the bounding-box matcher relates ids across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Create a new ObjectId with the given value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BB{}", self.0)
    }
}

/// 2D image feature position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub pt: Point2<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pt: Point2::new(x, y),
        }
    }
}

/// Frame-to-frame feature correspondence.
///
/// `prev_idx` indexes the previous frame's keypoints, `curr_idx` the current
/// frame's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypointMatch {
    pub prev_idx: usize,
    pub curr_idx: usize,
}

impl KeypointMatch {
    pub fn new(prev_idx: usize, curr_idx: usize) -> Self {
        Self { prev_idx, curr_idx }
    }

    /// Resolve both ends, or `None` if either index is out of range.
    pub fn resolve<'a>(
        &self,
        kpts_prev: &'a [Keypoint],
        kpts_curr: &'a [Keypoint],
    ) -> Option<(&'a Keypoint, &'a Keypoint)> {
        Some((kpts_prev.get(self.prev_idx)?, kpts_curr.get(self.curr_idx)?))
    }
}
