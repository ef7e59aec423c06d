//! Keypoint-correspondence ↔ object association with displacement outlier rejection.

use nalgebra::distance;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Keypoint, KeypointMatch, ObjectCluster};
use crate::stats::MeanStd;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointFilterConfig {
    /// ROI shrink fraction applied before the containment test.
    pub shrink: f64,
    /// Accepted displacement band half-width, in standard deviations.
    pub displacement_sigma: f64,
}

impl Default for KeypointFilterConfig {
    fn default() -> Self {
        Self {
            shrink: 0.10,
            displacement_sigma: 1.7,
        }
    }
}

/// Pixel displacement of one correspondence, if both ends resolve.
fn displacement(m: &KeypointMatch, kpts_prev: &[Keypoint], kpts_curr: &[Keypoint]) -> Option<f64> {
    m.resolve(kpts_prev, kpts_curr)
        .map(|(p, c)| distance(&p.pt, &c.pt))
}

/// Assign to `cluster` the frame correspondences that belong to its object.
///
/// Displacement statistics are taken over *all* correspondences of the frame,
/// characterizing the frame's overall apparent motion. A correspondence is
/// kept iff both its keypoints lie inside the shrunk ROI and its displacement
/// is within `mean ± displacement_sigma · std`.
///
/// # Arguments
/// * `cluster` - Current-frame object; `keypoint_match_indices` is replaced
/// * `kpts_prev` / `kpts_curr` - Previous and current keypoint sets
/// * `matches` - Every correspondence of the frame (indices refer to this slice)
///
/// # Returns
/// Number of correspondences assigned.
pub fn cluster_keypoint_matches_with_roi(
    cluster: &mut ObjectCluster,
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    matches: &[KeypointMatch],
    config: &KeypointFilterConfig,
) -> usize {
    cluster.keypoint_match_indices.clear();

    let Some(motion) =
        MeanStd::from_samples(matches.iter().filter_map(|m| displacement(m, kpts_prev, kpts_curr)))
    else {
        debug!("{}: no resolvable keypoint matches in frame", cluster.id);
        return 0;
    };

    let roi = cluster.roi.shrink(config.shrink);
    for (idx, m) in matches.iter().enumerate() {
        let Some((prev, curr)) = m.resolve(kpts_prev, kpts_curr) else {
            continue;
        };
        if !(roi.contains(&prev.pt) && roi.contains(&curr.pt)) {
            continue;
        }
        if motion.within(distance(&prev.pt, &curr.pt), config.displacement_sigma) {
            cluster.keypoint_match_indices.push(idx);
        }
    }

    debug!(
        "{}: {} keypoint matches kept (frame displacement {:.2} ± {:.2} px over {})",
        cluster.id,
        cluster.keypoint_match_indices.len(),
        motion.mean,
        motion.std,
        motion.count
    );
    cluster.keypoint_match_indices.len()
}
