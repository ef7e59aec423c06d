//! Sequence directory loader.
//!
//! ```text
//! <seq>/calib.yaml           p_rect, r_rect, rt (row-major)
//! <seq>/boxes/NNNN.csv       id,x,y,width,height
//! <seq>/keypoints/NNNN.csv   x,y
//! <seq>/matches/NNNN.csv     prev_idx,curr_idx
//! <seq>/lidar/NNNN.bin       KITTI scan: float32 x,y,z,r little endian
//! ```
//!
//! Frames are discovered from `boxes/`. CSV files may carry `#` comments and
//! a header row. Missing keypoint, match or lidar files yield empty arrays.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use nalgebra::{Matrix3, Matrix3x4, Matrix4};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::frame::{Frame, Keypoint, KeypointMatch, ObjectId};
use crate::geometry::{PixelRect, ProjectionChain};
use crate::lidar::{LidarCrop, RangePoint};

/// Bytes per KITTI lidar return (4 × f32).
const LIDAR_RECORD_BYTES: usize = 16;

/// Camera/lidar calibration of a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Rectified projection (3×4).
    pub p_rect: Matrix3x4<f64>,
    /// Rectifying rotation, homogeneous.
    pub r_rect: Matrix4<f64>,
    /// Lidar → camera extrinsic, homogeneous.
    pub rt: Matrix4<f64>,
}

/// calib.yaml layout. `r_rect` may be 3×3 or 4×4, `rt` 3×4 or 4×4.
#[derive(Debug, Deserialize)]
struct CalibrationYaml {
    p_rect: Vec<f64>,
    r_rect: Vec<f64>,
    rt: Vec<f64>,
}

impl Calibration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml: CalibrationYaml = serde_yaml::from_reader(
            File::open(path).with_context(|| format!("Failed to open {:?}", path))?,
        )
        .with_context(|| format!("Failed to parse {:?}", path))?;

        if yaml.p_rect.len() != 12 {
            bail!("Expected 12 elements for p_rect, got {}", yaml.p_rect.len());
        }
        Ok(Self {
            p_rect: Matrix3x4::from_row_slice(&yaml.p_rect),
            r_rect: homogeneous_from(&yaml.r_rect, "r_rect")?,
            rt: homogeneous_from(&yaml.rt, "rt")?,
        })
    }

    pub fn projection_chain(&self) -> ProjectionChain {
        ProjectionChain::new(self.p_rect, self.r_rect, self.rt)
    }
}

/// Pad a row-major 3×3 or 3×4 matrix to 4×4; pass 4×4 through.
fn homogeneous_from(data: &[f64], name: &str) -> Result<Matrix4<f64>> {
    let mut m = Matrix4::identity();
    match data.len() {
        16 => m = Matrix4::from_row_slice(data),
        12 => m
            .fixed_view_mut::<3, 4>(0, 0)
            .copy_from(&Matrix3x4::from_row_slice(data)),
        9 => m
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&Matrix3::from_row_slice(data)),
        n => bail!("Expected 9, 12 or 16 elements for {}, got {}", name, n),
    }
    Ok(m)
}

#[derive(Debug, Clone)]
struct FrameEntry {
    index: usize,
    /// File stem as found on disk (keeps zero padding).
    stem: String,
}

/// A sequence directory with lazily loaded frames.
#[derive(Debug)]
pub struct SequenceDataset {
    root: PathBuf,
    entries: Vec<FrameEntry>,
    pub calibration: Calibration,
    pub crop: LidarCrop,
}

impl SequenceDataset {
    pub fn new<P: AsRef<Path>>(root: P, crop: LidarCrop) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let calibration = Calibration::load(root.join("calib.yaml"))?;
        let entries = discover_frames(&root.join("boxes"))?;
        if entries.is_empty() {
            bail!("No frames found in {}", root.join("boxes").display());
        }
        info!("Sequence {}: {} frames", root.display(), entries.len());

        Ok(Self {
            root,
            entries,
            calibration,
            crop,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frame indices in processing order.
    pub fn frame_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.index)
    }

    /// Load the `pos`-th frame of the sequence (lidar already cropped).
    pub fn load_frame(&self, pos: usize) -> Result<Frame> {
        let entry = self
            .entries
            .get(pos)
            .with_context(|| format!("No frame at position {}", pos))?;
        let file = |dir: &str, ext: &str| self.root.join(dir).join(format!("{}.{}", entry.stem, ext));

        let boxes = load_boxes(&file("boxes", "csv"))?;

        let keypoints_path = file("keypoints", "csv");
        let keypoints = if keypoints_path.exists() {
            load_keypoints(&keypoints_path)?
        } else {
            warn!("Frame {}: no keypoint file", entry.index);
            Vec::new()
        };

        let matches_path = file("matches", "csv");
        let matches = if matches_path.exists() {
            load_matches(&matches_path)?
        } else {
            debug!("Frame {}: no keypoint matches", entry.index);
            Vec::new()
        };

        let lidar_path = file("lidar", "bin");
        let mut lidar = if lidar_path.exists() {
            load_lidar_bin(&lidar_path)?
        } else {
            warn!("Frame {}: no lidar scan", entry.index);
            Vec::new()
        };
        let raw = lidar.len();
        self.crop.apply(&mut lidar);

        debug!(
            "Frame {}: {} boxes, {} keypoints, {} matches, lidar {} of {} after crop",
            entry.index,
            boxes.len(),
            keypoints.len(),
            matches.len(),
            lidar.len(),
            raw
        );
        Ok(Frame::new(entry.index, boxes, lidar, keypoints, matches))
    }
}

fn discover_frames(dir: &Path) -> Result<Vec<FrameEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = item?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match stem.parse::<usize>() {
            Ok(index) => entries.push(FrameEntry {
                index,
                stem: stem.to_string(),
            }),
            Err(_) => warn!("Ignoring {}: file name is not a frame index", path.display()),
        }
    }
    entries.sort_by_key(|e| e.index);
    Ok(entries)
}

/// Read the data rows of a CSV file, skipping comments and a leading header.
fn read_rows(path: &Path, min_fields: usize) -> Result<Vec<StringRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("Malformed CSV in {}", path.display()))?;
        if i == 0 && rec.get(0).is_some_and(|f| f.parse::<f64>().is_err()) {
            continue;
        }
        if rec.len() < min_fields {
            warn!(
                "{}: skipping row with {} fields (expected {})",
                path.display(),
                rec.len(),
                min_fields
            );
            continue;
        }
        rows.push(rec);
    }
    Ok(rows)
}

fn field<T>(rec: &StringRecord, col: usize, path: &Path) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = rec.get(col).unwrap_or_default();
    raw.parse()
        .with_context(|| format!("{}: invalid value '{}' in column {}", path.display(), raw, col))
}

pub fn load_boxes(path: &Path) -> Result<Vec<(ObjectId, PixelRect)>> {
    let mut boxes = Vec::new();
    for rec in read_rows(path, 5)? {
        let id = ObjectId(field(&rec, 0, path)?);
        let rect = PixelRect::new(
            field(&rec, 1, path)?,
            field(&rec, 2, path)?,
            field(&rec, 3, path)?,
            field(&rec, 4, path)?,
        );
        if ![rect.x, rect.y, rect.width, rect.height].iter().all(|v| v.is_finite()) {
            warn!("{}: skipping {} with non-finite geometry", path.display(), id);
            continue;
        }
        if rect.width < 0.0 || rect.height < 0.0 {
            warn!("{}: skipping {} with negative size", path.display(), id);
            continue;
        }
        boxes.push((id, rect));
    }
    Ok(boxes)
}

pub fn load_keypoints(path: &Path) -> Result<Vec<Keypoint>> {
    read_rows(path, 2)?
        .iter()
        .map(|rec| -> Result<Keypoint> { Ok(Keypoint::new(field(rec, 0, path)?, field(rec, 1, path)?)) })
        .collect()
}

pub fn load_matches(path: &Path) -> Result<Vec<KeypointMatch>> {
    read_rows(path, 2)?
        .iter()
        .map(|rec| -> Result<KeypointMatch> {
            Ok(KeypointMatch::new(field(rec, 0, path)?, field(rec, 1, path)?))
        })
        .collect()
}

/// Read a KITTI velodyne scan. Non-finite returns are dropped.
pub fn load_lidar_bin(path: &Path) -> Result<Vec<RangePoint>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let trailing = bytes.len() % LIDAR_RECORD_BYTES;
    if trailing != 0 {
        warn!("{}: ignoring {} trailing bytes", path.display(), trailing);
    }

    let points = bytes
        .chunks_exact(LIDAR_RECORD_BYTES)
        .map(|c| {
            let f = |o: usize| f32::from_le_bytes([c[o], c[o + 1], c[o + 2], c[o + 3]]) as f64;
            RangePoint::new(f(0), f(4), f(8), f(12))
        })
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite() && p.r.is_finite())
        .collect();
    Ok(points)
}
