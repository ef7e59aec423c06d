//! Time-to-collision estimation.
//!
//! Two independent estimators run per matched object pair:
//! - [`camera`]: relative scale change between matched keypoints
//! - [`lidar`]: closing distance of the nearest inlier lidar return, under a
//!   constant-velocity or constant-acceleration model whose
//!   [`KinematicState`] is carried across frames
//!
//! Estimators are total: degenerate input yields [`Ttc::Unavailable`] rather
//! than an error or a non-finite number.

pub mod camera;
pub mod kinematics;
pub mod lidar;

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize, Serializer};

pub use camera::{CameraTtcConfig, compute_ttc_camera};
pub use kinematics::KinematicState;
pub use lidar::{LidarTtcConfig, compute_ttc_lidar};

/// Why a TTC could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Frame rate not strictly positive.
    InvalidFrameRate,
    /// No lidar points in the previous or current cluster.
    EmptyCluster,
    /// Every lidar point was rejected as an outlier.
    NoInlierPoints,
    /// No keypoint pair passed the distance checks.
    NoDistanceRatios,
    /// Median distance ratio of exactly one.
    NoScaleChange,
    /// Closest distance unchanged between frames.
    ZeroRelativeMotion,
    /// Constant-acceleration equation has no real root.
    NegativeDiscriminant,
    /// Constant-acceleration equation has no positive root.
    NoPositiveRoot,
    /// Arithmetic produced NaN or infinity.
    NonFinite,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidFrameRate => "invalid frame rate",
            Self::EmptyCluster => "empty cluster",
            Self::NoInlierPoints => "no inlier points",
            Self::NoDistanceRatios => "no distance ratios",
            Self::NoScaleChange => "no scale change",
            Self::ZeroRelativeMotion => "zero relative motion",
            Self::NegativeDiscriminant => "negative discriminant",
            Self::NoPositiveRoot => "no positive root",
            Self::NonFinite => "non-finite result",
        };
        f.write_str(s)
    }
}

/// Time-to-collision in seconds, or an explicit "unavailable" marker.
///
/// `Seconds` always holds a finite value. Negative values mean the object is
/// moving away under the chosen model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ttc {
    Seconds(f64),
    Unavailable(UnavailableReason),
}

impl Ttc {
    /// Wrap a computed value; non-finite values become `Unavailable(NonFinite)`.
    pub fn from_seconds(value: f64) -> Self {
        if value.is_finite() {
            Self::Seconds(value)
        } else {
            Self::Unavailable(UnavailableReason::NonFinite)
        }
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(s) => Some(*s),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Seconds(_))
    }
}

impl fmt::Display for Ttc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{:.3} s", s),
            Self::Unavailable(r) => write!(f, "n/a ({})", r),
        }
    }
}

/// Serialized as an optional number: unavailable values become `null` /
/// an empty CSV cell.
impl Serialize for Ttc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.seconds().serialize(serializer)
    }
}

/// Motion model used by the lidar estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtcModel {
    #[default]
    ConstantVelocity,
    ConstantAcceleration,
}

impl FromStr for TtcModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cv" | "constant_velocity" => Ok(Self::ConstantVelocity),
            "ca" | "constant_acceleration" => Ok(Self::ConstantAcceleration),
            other => bail!("Unknown TTC model '{}' (expected cv or ca)", other),
        }
    }
}

/// Frame interval in seconds, or `None` for a non-positive / non-finite rate.
pub(crate) fn frame_interval(frame_rate: f64) -> Option<f64> {
    (frame_rate > 0.0 && frame_rate.is_finite()).then(|| 1.0 / frame_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_seconds_rejects_non_finite() {
        assert_eq!(Ttc::from_seconds(1.5), Ttc::Seconds(1.5));
        assert_eq!(
            Ttc::from_seconds(f64::INFINITY),
            Ttc::Unavailable(UnavailableReason::NonFinite)
        );
        assert!(!Ttc::from_seconds(f64::NAN).is_available());
    }

    #[test]
    fn test_display() {
        assert_eq!(Ttc::Seconds(0.9).to_string(), "0.900 s");
        assert_eq!(
            Ttc::Unavailable(UnavailableReason::EmptyCluster).to_string(),
            "n/a (empty cluster)"
        );
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!("cv".parse::<TtcModel>().unwrap(), TtcModel::ConstantVelocity);
        assert_eq!(
            "Constant_Acceleration".parse::<TtcModel>().unwrap(),
            TtcModel::ConstantAcceleration
        );
        assert!("kalman".parse::<TtcModel>().is_err());
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(10.0), Some(0.1));
        assert_eq!(frame_interval(0.0), None);
        assert_eq!(frame_interval(-5.0), None);
    }
}
