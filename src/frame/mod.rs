//! Per-frame data: detected objects, lidar scan, keypoints and matches.
//!
//! A [`Frame`] owns every array produced by the upstream collaborators for one
//! camera/lidar capture. [`ObjectCluster`]s reference those arrays by index:
//!
//! ```text
//! Frame
//!  ├── lidar_points:      [RangePoint]     ◄── cluster.lidar_indices
//!  ├── keypoints:         [Keypoint]
//!  ├── keypoint_matches:  [KeypointMatch]  ◄── cluster.keypoint_match_indices
//!  └── objects:           [ObjectCluster]
//! ```

pub mod cluster;
pub mod types;

pub use cluster::ObjectCluster;
pub use types::{Keypoint, KeypointMatch, ObjectId};

use crate::geometry::PixelRect;
use crate::lidar::RangePoint;

/// All data captured for one time step.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Sequence index of this frame.
    pub index: usize,
    pub objects: Vec<ObjectCluster>,
    pub lidar_points: Vec<RangePoint>,
    pub keypoints: Vec<Keypoint>,
    /// Correspondences from the previous frame's keypoints to `keypoints`.
    /// Empty for the first frame of a run.
    pub keypoint_matches: Vec<KeypointMatch>,
}

impl Frame {
    pub fn new(
        index: usize,
        detections: impl IntoIterator<Item = (ObjectId, PixelRect)>,
        lidar_points: Vec<RangePoint>,
        keypoints: Vec<Keypoint>,
        keypoint_matches: Vec<KeypointMatch>,
    ) -> Self {
        Self {
            index,
            objects: detections
                .into_iter()
                .map(|(id, roi)| ObjectCluster::new(id, roi))
                .collect(),
            lidar_points,
            keypoints,
            keypoint_matches,
        }
    }

    /// Look up an object by id (first occurrence).
    pub fn object(&self, id: ObjectId) -> Option<&ObjectCluster> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectCluster> {
        self.objects.iter_mut().find(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_lookup() {
        let frame = Frame::new(
            0,
            vec![
                (ObjectId(4), PixelRect::new(0.0, 0.0, 10.0, 10.0)),
                (ObjectId(9), PixelRect::new(20.0, 0.0, 10.0, 10.0)),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(frame.object(ObjectId(9)).unwrap().roi.x, 20.0);
        assert!(frame.object(ObjectId(5)).is_none());
    }

    #[test]
    fn test_cluster_gathers_by_index() {
        let mut frame = Frame::new(
            0,
            vec![(ObjectId(1), PixelRect::new(0.0, 0.0, 10.0, 10.0))],
            vec![
                RangePoint::new(5.0, 0.0, 0.0, 0.1),
                RangePoint::new(6.0, 0.0, 0.0, 0.2),
                RangePoint::new(7.0, 0.0, 0.0, 0.3),
            ],
            Vec::new(),
            Vec::new(),
        );
        frame.object_mut(ObjectId(1)).unwrap().lidar_indices = vec![0, 2, 99];

        let cluster = frame.object(ObjectId(1)).unwrap();
        let pts = cluster.lidar_points(&frame.lidar_points);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[1].x, 7.0);
    }
}
