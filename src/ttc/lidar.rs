//! Lidar-based TTC from the closest inlier return of an object.
//!
//! Per frame, returns outside `mean ± k·std` in forward distance or in
//! reflectivity are rejected (stray returns, license plates, dark trim) and
//! the minimum remaining `x` is taken as the object's closest edge.
//!
//! Constant-velocity model, with `v = (x_prev - x_curr) / dT`:
//!
//! ```text
//! TTC = x_curr · dT / (x_prev - x_curr)
//! ```
//!
//! Constant-acceleration model, once velocity `v` and acceleration `a` are
//! known, solves `x_curr = v·t + ½·a·t²` for the smallest positive `t`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lidar::RangePoint;
use crate::stats::MeanStd;
use crate::ttc::{KinematicState, Ttc, TtcModel, UnavailableReason, frame_interval};

/// Closing distance (m) below which two frames are treated as motionless.
const MIN_CLOSING_DISTANCE: f64 = 1e-9;

/// Acceleration magnitude (m/s²) below which the quadratic degenerates to linear.
const MIN_ACCELERATION: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarTtcConfig {
    /// Forward-distance inlier band, in standard deviations.
    pub distance_sigma: f64,
    /// Reflectivity inlier band, in standard deviations.
    pub intensity_sigma: f64,
}

impl Default for LidarTtcConfig {
    fn default() -> Self {
        Self {
            distance_sigma: 2.0,
            intensity_sigma: 1.6,
        }
    }
}

/// Minimum forward distance among the statistically inlying points.
///
/// Returns `Err` with the reason when the set is empty or every point is
/// rejected.
pub fn closest_distance(
    points: &[RangePoint],
    config: &LidarTtcConfig,
) -> Result<f64, UnavailableReason> {
    let (Some(x_stats), Some(r_stats)) = (
        MeanStd::from_samples(points.iter().map(|p| p.x)),
        MeanStd::from_samples(points.iter().map(|p| p.r)),
    ) else {
        return Err(UnavailableReason::EmptyCluster);
    };

    points
        .iter()
        .filter(|p| {
            x_stats.within(p.x, config.distance_sigma) && r_stats.within(p.r, config.intensity_sigma)
        })
        .map(|p| p.x)
        .min_by(|a, b| a.total_cmp(b))
        .ok_or(UnavailableReason::NoInlierPoints)
}

/// Constant-velocity TTC from two closest-edge distances.
pub fn constant_velocity_ttc(min_x_prev: f64, min_x_curr: f64, dt: f64) -> Ttc {
    let closing = min_x_prev - min_x_curr;
    if closing.abs() < MIN_CLOSING_DISTANCE {
        return Ttc::Unavailable(UnavailableReason::ZeroRelativeMotion);
    }
    Ttc::from_seconds(min_x_curr * dt / closing)
}

/// Solve `min_x_curr = v·t + ½·a·t²` for the collision time.
///
/// Normalized to `t² + b·t + c = 0` with `b = v / (½a)`, `c = -x / (½a)`:
/// - two real roots: the smaller if both are positive, the positive one if
///   only one is, otherwise unavailable
/// - one double root: `-b / 2`
/// - no real root: unavailable
pub fn constant_acceleration_ttc(min_x_curr: f64, velocity: f64, acceleration: f64) -> Ttc {
    if acceleration.abs() < MIN_ACCELERATION {
        if velocity.abs() < MIN_CLOSING_DISTANCE {
            return Ttc::Unavailable(UnavailableReason::ZeroRelativeMotion);
        }
        let t = min_x_curr / velocity;
        return if t > 0.0 {
            Ttc::from_seconds(t)
        } else {
            Ttc::Unavailable(UnavailableReason::NoPositiveRoot)
        };
    }

    let a = 1.0;
    let b = velocity / (0.5 * acceleration);
    let c = -min_x_curr / (0.5 * acceleration);
    let d = b * b - 4.0 * a * c;

    if d > 0.0 {
        let sqrt_d = d.sqrt();
        let t1 = (-b - sqrt_d) / (2.0 * a);
        let t2 = (-b + sqrt_d) / (2.0 * a);
        match (t1 > 0.0, t2 > 0.0) {
            (true, true) => Ttc::from_seconds(t1.min(t2)),
            (true, false) => Ttc::from_seconds(t1),
            (false, true) => Ttc::from_seconds(t2),
            (false, false) => Ttc::Unavailable(UnavailableReason::NoPositiveRoot),
        }
    } else if d == 0.0 {
        Ttc::from_seconds(b / (-2.0 * a))
    } else if d < 0.0 {
        Ttc::Unavailable(UnavailableReason::NegativeDiscriminant)
    } else {
        Ttc::Unavailable(UnavailableReason::NonFinite)
    }
}

/// Lidar TTC for one object pair, updating the run's kinematic state.
///
/// Under [`TtcModel::ConstantAcceleration`] the state is advanced once per
/// call: while acceleration is unknown the frame's velocity sample is fed to
/// [`KinematicState::observe_velocity`] and the constant-velocity TTC is
/// reported; afterwards the quadratic is solved and the velocity propagated
/// by `a·dT`. Degenerate input leaves the state untouched.
///
/// # Arguments
/// * `prev` / `curr` - The object's lidar points in the previous and current frame
/// * `frame_rate` - Frames per second
/// * `state` - Kinematic state of the run (read and updated)
/// * `model` - Motion model
pub fn compute_ttc_lidar(
    prev: &[RangePoint],
    curr: &[RangePoint],
    frame_rate: f64,
    state: &mut KinematicState,
    model: TtcModel,
    config: &LidarTtcConfig,
) -> Ttc {
    let Some(dt) = frame_interval(frame_rate) else {
        return Ttc::Unavailable(UnavailableReason::InvalidFrameRate);
    };
    if prev.is_empty() || curr.is_empty() {
        return Ttc::Unavailable(UnavailableReason::EmptyCluster);
    }

    // Closest inlier edge in both frames
    let (min_x_prev, min_x_curr) =
        match (closest_distance(prev, config), closest_distance(curr, config)) {
            (Ok(p), Ok(c)) => (p, c),
            (Err(reason), _) | (_, Err(reason)) => {
                debug!("Lidar TTC unavailable: {}", reason);
                return Ttc::Unavailable(reason);
            }
        };

    // Apply the motion model, stepping the state forward where it applies
    let ttc = match model {
        TtcModel::ConstantVelocity => constant_velocity_ttc(min_x_prev, min_x_curr, dt),
        TtcModel::ConstantAcceleration => match *state {
            KinematicState::VelocityAndAccelerationKnown {
                velocity,
                acceleration,
            } => {
                let ttc = constant_acceleration_ttc(min_x_curr, velocity, acceleration);
                state.advance(dt);
                ttc
            }
            // Acceleration not yet known: feed this frame's velocity sample
            _ => {
                state.observe_velocity((min_x_prev - min_x_curr) / dt, dt);
                constant_velocity_ttc(min_x_prev, min_x_curr, dt)
            }
        },
    };

    debug!(
        "Lidar TTC {} (min x {:.3} -> {:.3} m, {:?}, state {:?})",
        ttc, min_x_prev, min_x_curr, model, state
    );
    ttc
}
