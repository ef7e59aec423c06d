//! Lidar-to-image projection.
//!
//! The chain follows the KITTI calibration convention:
//!
//! ```text
//! [u·w, v·w, w]ᵀ = P_rect · R_rect · T_cam_lidar · [x, y, z, 1]ᵀ
//! ```
//!
//! - `P_rect` (3×4): intrinsic projection after rectification
//! - `R_rect` (4×4): rectifying rotation (padded to homogeneous form)
//! - `T_cam_lidar` (4×4): extrinsic lidar → camera transform
//!
//! The product is collapsed once at construction; the chain is constant
//! for a run.

use nalgebra::{Matrix3x4, Matrix4, Point2, Vector4};

use crate::lidar::RangePoint;

/// Fixed sensor-frame → pixel projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionChain {
    matrix: Matrix3x4<f64>,
}

impl ProjectionChain {
    /// Compose intrinsic · rectification · extrinsic.
    pub fn new(p_rect: Matrix3x4<f64>, r_rect: Matrix4<f64>, t_cam_lidar: Matrix4<f64>) -> Self {
        Self {
            matrix: p_rect * r_rect * t_cam_lidar,
        }
    }

    /// Use an already-composed 3×4 matrix.
    pub fn from_matrix(matrix: Matrix3x4<f64>) -> Self {
        Self { matrix }
    }

    /// Project a sensor-frame position to pixel coordinates.
    ///
    /// Returns `None` when the point lies on or behind the image plane
    /// (non-positive depth) or the result is not finite.
    pub fn project(&self, x: f64, y: f64, z: f64) -> Option<Point2<f64>> {
        let h = self.matrix * Vector4::new(x, y, z, 1.0);
        let depth = h[2];
        if depth <= 0.0 || !depth.is_finite() {
            return None;
        }
        let px = Point2::new(h[0] / depth, h[1] / depth);
        (px.x.is_finite() && px.y.is_finite()).then_some(px)
    }

    pub fn project_point(&self, point: &RangePoint) -> Option<Point2<f64>> {
        self.project(point.x, point.y, point.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Camera looking along lidar +x: cam x = -lidar y, cam y = -lidar z, cam z = lidar x.
    fn forward_chain() -> ProjectionChain {
        let p_rect = Matrix3x4::new(
            700.0, 0.0, 600.0, 0.0, //
            0.0, 700.0, 180.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        );
        let rt = Matrix4::new(
            0.0, -1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        ProjectionChain::new(p_rect, Matrix4::identity(), rt)
    }

    #[test]
    fn test_point_on_axis_hits_principal_point() {
        let chain = forward_chain();
        let px = chain.project(10.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(px, Point2::new(600.0, 180.0), epsilon = 1e-9);
    }

    #[test]
    fn test_left_point_projects_left() {
        let chain = forward_chain();
        let px = chain.project(10.0, 1.0, 0.0).unwrap();
        assert_relative_eq!(px.x, 600.0 - 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_behind_camera_is_rejected() {
        let chain = forward_chain();
        assert!(chain.project(-5.0, 0.0, 0.0).is_none());
        assert!(chain.project(0.0, 1.0, 1.0).is_none());
    }
}
