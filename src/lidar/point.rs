use serde::{Deserialize, Serialize};

/// Single lidar return in the sensor frame.
///
/// - `x`: forward (m)
/// - `y`: left (m)
/// - `z`: up (m)
/// - `r`: reflectivity in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl RangePoint {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }
}
