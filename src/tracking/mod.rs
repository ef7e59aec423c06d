//! Frame-to-frame association: object boxes and keypoint correspondences.
//!
//! - [`match_bounding_boxes`]: previous ↔ current object ids by IoU
//! - [`cluster_keypoint_matches_with_roi`]: correspondences belonging to one object

pub mod bbox_matcher;
pub mod keypoint_filter;

pub use bbox_matcher::{BoxMatcherConfig, MatchPolicy, match_bounding_boxes};
pub use keypoint_filter::{KeypointFilterConfig, cluster_keypoint_matches_with_roi};
