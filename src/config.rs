//! Run configuration, loaded from YAML.
//!
//! Every field has a default, so a partial file (or none at all) is valid:
//!
//! ```yaml
//! frame_rate: 10.0
//! lidar_shrink: 0.10
//! model: constant_acceleration
//! matching:
//!   iou_threshold: 0.7
//!   policy: greedy
//! keypoints:
//!   shrink: 0.10
//!   displacement_sigma: 1.7
//! camera:
//!   min_keypoint_distance: 100.0
//! lidar:
//!   distance_sigma: 2.0
//!   intensity_sigma: 1.6
//! crop:
//!   min_x: 2.0
//!   max_x: 20.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::lidar::{DEFAULT_LIDAR_SHRINK, LidarCrop};
use crate::tracking::{BoxMatcherConfig, KeypointFilterConfig};
use crate::ttc::{CameraTtcConfig, LidarTtcConfig, TtcModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Camera/lidar capture rate (frames per second).
    pub frame_rate: f64,
    /// ROI shrink used when associating lidar points with objects.
    pub lidar_shrink: f64,
    pub model: TtcModel,
    pub matching: BoxMatcherConfig,
    pub keypoints: KeypointFilterConfig,
    pub camera: CameraTtcConfig,
    pub lidar: LidarTtcConfig,
    pub crop: LidarCrop,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            lidar_shrink: DEFAULT_LIDAR_SHRINK,
            model: TtcModel::default(),
            matching: BoxMatcherConfig::default(),
            keypoints: KeypointFilterConfig::default(),
            camera: CameraTtcConfig::default(),
            lidar: LidarTtcConfig::default(),
            crop: LidarCrop::default(),
        }
    }
}

impl FusionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: FusionConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the estimators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_rate > 0.0 && self.frame_rate.is_finite()) {
            bail!("frame_rate must be positive, got {}", self.frame_rate);
        }
        for (name, s) in [
            ("lidar_shrink", self.lidar_shrink),
            ("keypoints.shrink", self.keypoints.shrink),
        ] {
            if !(0.0..1.0).contains(&s) {
                bail!("{} must be in [0, 1), got {}", name, s);
            }
        }
        if !(0.0..=1.0).contains(&self.matching.iou_threshold) {
            bail!(
                "matching.iou_threshold must be in [0, 1], got {}",
                self.matching.iou_threshold
            );
        }
        Ok(())
    }
}
