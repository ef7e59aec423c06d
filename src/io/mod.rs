//! Dataset loading and result output.
//!
//! - [`dataset`]: calibration, per-frame CSV inputs and KITTI lidar scans
//! - [`results`]: TTC records as CSV

pub mod dataset;
pub mod results;

pub use dataset::{Calibration, SequenceDataset};
pub use results::{write_records, write_records_to};
