//! Lidar ↔ image-ROI association.

use tracing::debug;

use crate::frame::ObjectCluster;
use crate::geometry::ProjectionChain;
use crate::lidar::RangePoint;

/// Default shrink applied to each ROI before testing lidar containment.
pub const DEFAULT_LIDAR_SHRINK: f64 = 0.10;

/// Counts returned by [`cluster_lidar_with_roi`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiAssociationStats {
    pub assigned: usize,
    /// Inside more than one shrunk ROI; dropped from all of them.
    pub ambiguous: usize,
    /// Behind the camera or outside every shrunk ROI.
    pub unassigned: usize,
}

/// Assign every lidar point to at most one object.
///
/// Each point is projected into the image and tested against every object's
/// ROI shrunk by `shrink` (center-preserving). A point enclosed by exactly one
/// shrunk ROI has its index appended to that object's `lidar_indices`; points
/// enclosed by several ROIs are dropped from all of them.
///
/// # Arguments
/// * `objects` - Current-frame objects; their `lidar_indices` are extended
/// * `points` - Current-frame lidar arena (indices refer to this slice)
/// * `shrink` - ROI shrink fraction in `[0, 1)`
/// * `chain` - Lidar → pixel projection
pub fn cluster_lidar_with_roi(
    objects: &mut [ObjectCluster],
    points: &[RangePoint],
    shrink: f64,
    chain: &ProjectionChain,
) -> RoiAssociationStats {
    let shrunk: Vec<_> = objects.iter().map(|o| o.roi.shrink(shrink)).collect();
    let mut stats = RoiAssociationStats::default();

    for (point_idx, point) in points.iter().enumerate() {
        let Some(px) = chain.project_point(point) else {
            stats.unassigned += 1;
            continue;
        };

        let mut n_enclosing = 0usize;
        let mut owner = 0usize;
        for (obj_idx, roi) in shrunk.iter().enumerate() {
            if roi.contains(&px) {
                n_enclosing += 1;
                owner = obj_idx;
            }
        }

        match n_enclosing {
            0 => stats.unassigned += 1,
            1 => {
                objects[owner].lidar_indices.push(point_idx);
                stats.assigned += 1;
            }
            _ => stats.ambiguous += 1,
        }
    }

    debug!(
        "Lidar ROI association: {} assigned, {} ambiguous, {} unassigned ({} objects)",
        stats.assigned,
        stats.ambiguous,
        stats.unassigned,
        objects.len()
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ObjectId;
    use crate::geometry::PixelRect;
    use nalgebra::Matrix3x4;

    /// Identity-like projection: pixel = (x / z, y / z) with z as depth.
    fn pinhole() -> ProjectionChain {
        ProjectionChain::from_matrix(Matrix3x4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        ))
    }

    /// Lidar point landing at pixel (u, v) under [`pinhole`].
    fn at_pixel(u: f64, v: f64) -> RangePoint {
        RangePoint::new(u * 2.0, v * 2.0, 2.0, 0.5)
    }

    fn objects(rois: &[PixelRect]) -> Vec<ObjectCluster> {
        rois.iter()
            .enumerate()
            .map(|(i, r)| ObjectCluster::new(ObjectId(i as u32), *r))
            .collect()
    }

    #[test]
    fn test_single_owner_is_assigned() {
        let mut objs = objects(&[PixelRect::new(0.0, 0.0, 100.0, 100.0)]);
        let pts = vec![at_pixel(50.0, 50.0)];

        let stats = cluster_lidar_with_roi(&mut objs, &pts, 0.1, &pinhole());

        assert_eq!(objs[0].lidar_indices, vec![0]);
        assert_eq!(stats.assigned, 1);
    }

    #[test]
    fn test_overlap_drops_point() {
        let mut objs = objects(&[
            PixelRect::new(0.0, 0.0, 100.0, 100.0),
            PixelRect::new(40.0, 40.0, 100.0, 100.0),
        ]);
        let pts = vec![at_pixel(60.0, 60.0), at_pixel(20.0, 20.0), at_pixel(120.0, 120.0)];

        let stats = cluster_lidar_with_roi(&mut objs, &pts, 0.0, &pinhole());

        assert_eq!(objs[0].lidar_indices, vec![1]);
        assert_eq!(objs[1].lidar_indices, vec![2]);
        assert_eq!(stats.ambiguous, 1);
    }

    #[test]
    fn test_shrink_rejects_edge_points() {
        let mut objs = objects(&[PixelRect::new(0.0, 0.0, 100.0, 100.0)]);
        // Shrunk ROI with s = 0.2 spans (10, 90).
        let pts = vec![at_pixel(5.0, 50.0), at_pixel(95.0, 50.0), at_pixel(11.0, 50.0)];

        cluster_lidar_with_roi(&mut objs, &pts, 0.2, &pinhole());

        assert_eq!(objs[0].lidar_indices, vec![2]);
    }

    #[test]
    fn test_shrink_separates_touching_rois() {
        let rois = [
            PixelRect::new(0.0, 0.0, 100.0, 100.0),
            PixelRect::new(90.0, 0.0, 100.0, 100.0),
        ];
        let pts = vec![at_pixel(95.0, 50.0)];

        let mut unshrunk = objects(&rois);
        cluster_lidar_with_roi(&mut unshrunk, &pts, 0.0, &pinhole());
        assert!(unshrunk.iter().all(|o| o.lidar_indices.is_empty()));

        // With s = 0.2 the first ROI ends at 90 and the second starts at 100.
        let mut shrunk = objects(&rois);
        let stats = cluster_lidar_with_roi(&mut shrunk, &pts, 0.2, &pinhole());
        assert!(shrunk.iter().all(|o| o.lidar_indices.is_empty()));
        assert_eq!(stats.unassigned, 1);
    }

    #[test]
    fn test_point_behind_camera_unassigned() {
        let mut objs = objects(&[PixelRect::new(-100.0, -100.0, 200.0, 200.0)]);
        let pts = vec![RangePoint::new(1.0, 1.0, -2.0, 0.5)];

        let stats = cluster_lidar_with_roi(&mut objs, &pts, 0.0, &pinhole());

        assert!(objs[0].lidar_indices.is_empty());
        assert_eq!(stats.unassigned, 1);
    }
}
