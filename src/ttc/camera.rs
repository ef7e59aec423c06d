//! Camera-based TTC from keypoint scale change.
//!
//! Under a pinhole model an approaching object's projected size grows by the
//! factor `h₁/h₀ = d₀/d₁` over one frame. Distances between pairs of keypoints
//! on the object scale by that same factor, so with `ratio = dist_curr / dist_prev`:
//!
//! ```text
//! TTC = -dT / (1 - ratio)
//! ```
//!
//! The median ratio over all keypoint pairs is used so a minority of bad
//! correspondences does not bias the estimate.

use nalgebra::distance;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Keypoint, KeypointMatch};
use crate::stats::median;
use crate::ttc::{Ttc, UnavailableReason, frame_interval};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTtcConfig {
    /// Minimum current-frame distance (px) between the two keypoints of a pair.
    pub min_keypoint_distance: f64,
}

impl Default for CameraTtcConfig {
    fn default() -> Self {
        Self {
            min_keypoint_distance: 100.0,
        }
    }
}

/// Distance ratios `dist_curr / dist_prev` over every unordered pair of matches.
///
/// Pairs whose previous-frame distance is ~0 or whose current-frame distance
/// is below `min_distance` are skipped; unresolvable matches are ignored.
pub fn distance_ratios(
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    matches: &[KeypointMatch],
    min_distance: f64,
) -> Vec<f64> {
    let resolved: Vec<_> = matches
        .iter()
        .filter_map(|m| m.resolve(kpts_prev, kpts_curr))
        .collect();

    let mut ratios = Vec::new();
    for (i, (outer_prev, outer_curr)) in resolved.iter().enumerate() {
        for (inner_prev, inner_curr) in &resolved[i + 1..] {
            let dist_curr = distance(&outer_curr.pt, &inner_curr.pt);
            let dist_prev = distance(&outer_prev.pt, &inner_prev.pt);

            if dist_prev > f64::EPSILON && dist_curr >= min_distance {
                ratios.push(dist_curr / dist_prev);
            }
        }
    }
    ratios
}

/// Camera TTC for one object from its filtered keypoint matches.
///
/// # Arguments
/// * `kpts_prev` / `kpts_curr` - Full keypoint sets of both frames
/// * `matches` - The object's correspondences (already ROI-filtered)
/// * `frame_rate` - Frames per second
pub fn compute_ttc_camera(
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    matches: &[KeypointMatch],
    frame_rate: f64,
    config: &CameraTtcConfig,
) -> Ttc {
    let Some(dt) = frame_interval(frame_rate) else {
        return Ttc::Unavailable(UnavailableReason::InvalidFrameRate);
    };

    let mut ratios = distance_ratios(kpts_prev, kpts_curr, matches, config.min_keypoint_distance);
    let Some(median_ratio) = median(&mut ratios) else {
        debug!(
            "Camera TTC unavailable: no valid keypoint pairs among {} matches",
            matches.len()
        );
        return Ttc::Unavailable(UnavailableReason::NoDistanceRatios);
    };

    let denom = 1.0 - median_ratio;
    if denom.abs() < f64::EPSILON {
        return Ttc::Unavailable(UnavailableReason::NoScaleChange);
    }

    let ttc = Ttc::from_seconds(-dt / denom);
    debug!(
        "Camera TTC {} from median ratio {:.5} over {} pairs",
        ttc,
        median_ratio,
        ratios.len()
    );
    ttc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 5x5 grid with 200 px spacing, scaled by `k` about the grid centre.
    fn scaled_grid(k: f64) -> (Vec<Keypoint>, Vec<Keypoint>, Vec<KeypointMatch>) {
        let center = (600.0, 400.0);
        let mut prev = Vec::new();
        let mut curr = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let x = 200.0 + i as f64 * 200.0;
                let y = j as f64 * 200.0;
                prev.push(Keypoint::new(x, y));
                curr.push(Keypoint::new(
                    center.0 + k * (x - center.0),
                    center.1 + k * (y - center.1),
                ));
            }
        }
        let matches = (0..prev.len()).map(|i| KeypointMatch::new(i, i)).collect();
        (prev, curr, matches)
    }

    #[test]
    fn test_uniform_shrink_recovers_scale() {
        let k = 0.9;
        let (prev, curr, matches) = scaled_grid(k);

        let mut ratios = distance_ratios(&prev, &curr, &matches, 100.0);
        assert_eq!(ratios.len(), 25 * 24 / 2);
        assert_relative_eq!(median(&mut ratios).unwrap(), k, epsilon = 1e-12);

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &CameraTtcConfig::default());
        assert_relative_eq!(ttc.seconds().unwrap(), -0.1 / (1.0 - k), epsilon = 1e-9);
    }

    #[test]
    fn test_approaching_object_positive_ttc() {
        let (prev, curr, matches) = scaled_grid(1.05);

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &CameraTtcConfig::default());

        assert_relative_eq!(ttc.seconds().unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_median_resists_minority_outliers() {
        let (prev, mut curr, matches) = scaled_grid(1.05);
        // Corrupt one correspondence.
        curr[0] = Keypoint::new(5000.0, 5000.0);

        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &CameraTtcConfig::default());

        assert_relative_eq!(ttc.seconds().unwrap(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_close_keypoints_skipped() {
        // Pairs are closer than 100 px in the current frame.
        let prev = vec![Keypoint::new(0.0, 0.0), Keypoint::new(50.0, 0.0)];
        let curr = vec![Keypoint::new(0.0, 0.0), Keypoint::new(55.0, 0.0)];
        let matches = vec![KeypointMatch::new(0, 0), KeypointMatch::new(1, 1)];

        assert!(distance_ratios(&prev, &curr, &matches, 100.0).is_empty());
        let ttc = compute_ttc_camera(&prev, &curr, &matches, 10.0, &CameraTtcConfig::default());
        assert_eq!(ttc, Ttc::Unavailable(UnavailableReason::NoDistanceRatios));
    }

    #[test]
    fn test_duplicate_previous_keypoint_skipped() {
        let prev = vec![Keypoint::new(10.0, 10.0)];
        let curr = vec![Keypoint::new(0.0, 0.0), Keypoint::new(300.0, 0.0)];
        // Both matches share the same previous keypoint: dist_prev = 0.
        let matches = vec![KeypointMatch::new(0, 0), KeypointMatch::new(0, 1)];

        assert!(distance_ratios(&prev, &curr, &matches, 100.0).is_empty());
    }

    #[test]
    fn test_degenerate_inputs() {
        let config = CameraTtcConfig::default();
        assert_eq!(
            compute_ttc_camera(&[], &[], &[], 10.0, &config),
            Ttc::Unavailable(UnavailableReason::NoDistanceRatios)
        );

        let (prev, curr, matches) = scaled_grid(1.0);
        assert_eq!(
            compute_ttc_camera(&prev, &curr, &matches, 10.0, &config),
            Ttc::Unavailable(UnavailableReason::NoScaleChange)
        );
        assert_eq!(
            compute_ttc_camera(&prev, &curr, &matches, 0.0, &config),
            Ttc::Unavailable(UnavailableReason::InvalidFrameRate)
        );
    }
}
