//! Previous ↔ current object association by bounding-box overlap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{ObjectCluster, ObjectId};

/// How conflicting associations are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Each previous box takes its best current box independently; several
    /// previous boxes may map to the same current box.
    #[default]
    Greedy,
    /// Keep a pair only if each box is the other's best overlap.
    MutualBest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxMatcherConfig {
    /// Minimum IoU (exclusive) for a pair to be accepted.
    pub iou_threshold: f64,
    pub policy: MatchPolicy,
}

impl Default for BoxMatcherConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.7,
            policy: MatchPolicy::Greedy,
        }
    }
}

/// Index of the best-overlapping candidate and its IoU.
///
/// Ties keep the first maximum encountered.
fn best_overlap<'a>(
    target: &ObjectCluster,
    candidates: impl Iterator<Item = &'a ObjectCluster>,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, cand) in candidates.enumerate() {
        let iou = target.roi.iou(&cand.roi);
        if best.is_none_or(|(_, max_iou)| iou > max_iou) {
            best = Some((idx, iou));
        }
    }
    best
}

/// Associate previous-frame objects with current-frame objects.
///
/// Returns `previous id → current id` for every previous object whose best
/// IoU exceeds the threshold. Under [`MatchPolicy::Greedy`] the mapping need
/// not be injective.
pub fn match_bounding_boxes(
    prev: &[ObjectCluster],
    curr: &[ObjectCluster],
    config: &BoxMatcherConfig,
) -> BTreeMap<ObjectId, ObjectId> {
    let mut matches = BTreeMap::new();

    for (prev_idx, prev_obj) in prev.iter().enumerate() {
        let Some((curr_idx, iou)) = best_overlap(prev_obj, curr.iter()) else {
            continue;
        };
        if iou <= config.iou_threshold {
            continue;
        }

        if config.policy == MatchPolicy::MutualBest {
            let back = best_overlap(&curr[curr_idx], prev.iter()).map(|(i, _)| i);
            if back != Some(prev_idx) {
                debug!(
                    "Dropping {} -> {}: not mutual best (IoU {:.3})",
                    prev_obj.id, curr[curr_idx].id, iou
                );
                continue;
            }
        }

        matches.entry(prev_obj.id).or_insert(curr[curr_idx].id);
    }

    debug!(
        "Matched {} of {} previous boxes against {} current boxes",
        matches.len(),
        prev.len(),
        curr.len()
    );
    matches
}
