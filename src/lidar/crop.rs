//! Ego-lane region-of-interest crop applied to raw scans.

use serde::{Deserialize, Serialize};

use crate::lidar::RangePoint;

/// Axis-aligned crop box in the sensor frame plus a reflectivity floor.
///
/// Defaults focus on the ego lane ahead of a roof-mounted KITTI scanner:
/// 2–20 m forward, ±2 m lateral, road-surface band in z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarCrop {
    pub min_x: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    pub min_r: f64,
}

impl Default for LidarCrop {
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 20.0,
            max_y: 2.0,
            min_z: -1.5,
            max_z: -0.9,
            min_r: 0.1,
        }
    }
}

impl LidarCrop {
    pub fn keeps(&self, p: &RangePoint) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.z >= self.min_z
            && p.z <= self.max_z
            && p.z <= 0.0
            && p.y.abs() <= self.max_y
            && p.r >= self.min_r
    }

    /// Retain only points inside the crop.
    pub fn apply(&self, points: &mut Vec<RangePoint>) {
        points.retain(|p| self.keeps(p));
    }
}
