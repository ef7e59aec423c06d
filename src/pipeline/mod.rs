//! Per-frame orchestration of association and TTC estimation.
//!
//! For every incoming [`Frame`]:
//! 1. Lidar points are clustered into the frame's object ROIs.
//! 2. Objects are matched against the previous frame by IoU.
//! 3. For each matched pair, in ascending previous-id order, the lidar TTC
//!    is computed from both clusters (advancing the run's
//!    [`KinematicState`]), the frame's keypoint correspondences are filtered
//!    to the current object, and the camera TTC is computed from them.
//!
//! Only the previous frame is retained.

pub mod record;

pub use record::TtcRecord;

use tracing::{debug, warn};

use crate::config::FusionConfig;
use crate::frame::Frame;
use crate::geometry::ProjectionChain;
use crate::lidar::cluster_lidar_with_roi;
use crate::tracking::{cluster_keypoint_matches_with_roi, match_bounding_boxes};
use crate::ttc::{KinematicState, compute_ttc_camera, compute_ttc_lidar};

/// Stateful frame processor for one run.
pub struct TtcPipeline {
    config: FusionConfig,
    chain: ProjectionChain,
    previous: Option<Frame>,
    state: KinematicState,
}

impl TtcPipeline {
    pub fn new(config: FusionConfig, chain: ProjectionChain) -> Self {
        Self {
            config,
            chain,
            previous: None,
            state: KinematicState::default(),
        }
    }

    pub fn kinematic_state(&self) -> KinematicState {
        self.state
    }

    /// The last processed frame, with its clusters populated.
    pub fn previous_frame(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    /// Forget the previous frame and the kinematic state (start a new run).
    pub fn reset(&mut self) {
        self.previous = None;
        self.state = KinematicState::default();
    }

    /// Process one frame and return a record per matched object pair.
    ///
    /// The first frame of a run only primes the pipeline and yields no records.
    pub fn process_frame(&mut self, mut frame: Frame) -> Vec<TtcRecord> {
        // 1. Assign lidar points to this frame's objects
        let assoc = cluster_lidar_with_roi(
            &mut frame.objects,
            &frame.lidar_points,
            self.config.lidar_shrink,
            &self.chain,
        );
        debug!(
            "Frame {}: {} objects, lidar {} assigned / {} ambiguous / {} unassigned",
            frame.index,
            frame.objects.len(),
            assoc.assigned,
            assoc.ambiguous,
            assoc.unassigned
        );

        // First frame of a run: nothing to compare against yet
        let Some(prev) = self.previous.take() else {
            self.previous = Some(frame);
            return Vec::new();
        };

        // 2. Associate objects with the previous frame
        let pairs = match_bounding_boxes(&prev.objects, &frame.objects, &self.config.matching);
        debug!(
            "Frame {}: {} of {} previous objects matched",
            frame.index,
            pairs.len(),
            prev.objects.len()
        );

        // 3. Estimate both TTCs per pair; BTreeMap order keeps state updates deterministic
        let mut records = Vec::with_capacity(pairs.len());
        for (prev_id, curr_id) in pairs {
            let (Some(prev_obj), Some(curr_pos)) = (
                prev.object(prev_id),
                frame.objects.iter().position(|o| o.id == curr_id),
            ) else {
                warn!("Frame {}: matched pair {} -> {} not found", frame.index, prev_id, curr_id);
                continue;
            };

            // Lidar TTC (advances the shared kinematic state)
            let lidar_prev = prev_obj.lidar_points(&prev.lidar_points);
            let lidar_curr = frame.objects[curr_pos].lidar_points(&frame.lidar_points);
            let lidar_ttc = compute_ttc_lidar(
                &lidar_prev,
                &lidar_curr,
                self.config.frame_rate,
                &mut self.state,
                self.config.model,
                &self.config.lidar,
            );

            // Camera TTC from this object's share of the keypoint matches
            let cluster = &mut frame.objects[curr_pos];
            let n_matches = cluster_keypoint_matches_with_roi(
                cluster,
                &prev.keypoints,
                &frame.keypoints,
                &frame.keypoint_matches,
                &self.config.keypoints,
            );
            let object_matches = cluster.keypoint_matches(&frame.keypoint_matches);
            let camera_ttc = compute_ttc_camera(
                &prev.keypoints,
                &frame.keypoints,
                &object_matches,
                self.config.frame_rate,
                &self.config.camera,
            );

            records.push(TtcRecord {
                frame_index: frame.index,
                prev_object_id: prev_id,
                curr_object_id: curr_id,
                lidar_ttc,
                camera_ttc,
                lidar_points_prev: lidar_prev.len(),
                lidar_points_curr: lidar_curr.len(),
                keypoint_matches: n_matches,
            });
        }

        // Current frame becomes the reference for the next one
        self.previous = Some(frame);
        records
    }
}
