//! Lidar data: range points, ego-lane crop, ROI association.

pub mod crop;
pub mod point;
pub mod roi;

pub use crop::LidarCrop;
pub use point::RangePoint;
pub use roi::{DEFAULT_LIDAR_SHRINK, RoiAssociationStats, cluster_lidar_with_roi};
