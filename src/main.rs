use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ttc_fusion::config::FusionConfig;
use ttc_fusion::io::{SequenceDataset, write_records};
use ttc_fusion::pipeline::TtcRecord;
use ttc_fusion::system::{FrameResult, FusionSystem};
use ttc_fusion::ttc::TtcModel;

#[derive(Parser)]
#[command(name = "ttc-fusion")]
#[command(about = "Camera + lidar time-to-collision for tracked objects")]
struct Args {
    /// Sequence directory (calib.yaml, boxes/, keypoints/, matches/, lidar/)
    sequence: PathBuf,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write TTC records to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Lidar motion model: cv (constant velocity) or ca (constant acceleration)
    #[arg(long)]
    model: Option<TtcModel>,

    /// Frames per second (overrides the configuration)
    #[arg(long)]
    frame_rate: Option<f64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            FusionConfig::load(path)?
        }
        None => FusionConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(frame_rate) = args.frame_rate {
        config.frame_rate = frame_rate;
    }
    info!(
        "Model {:?} at {} Hz, IoU threshold {}",
        config.model, config.frame_rate, config.matching.iou_threshold
    );

    let dataset = SequenceDataset::new(&args.sequence, config.crop)
        .with_context(|| format!("Failed to open sequence {:?}", args.sequence))?;
    let system = FusionSystem::new(config, dataset.calibration.projection_chain())?;

    let mut records: Vec<TtcRecord> = Vec::new();
    for pos in 0..dataset.len() {
        let frame = dataset.load_frame(pos)?;
        system.submit(frame)?;
        for result in system.try_results() {
            report(&result, &mut records);
        }
    }
    for result in system.finish()? {
        report(&result, &mut records);
    }

    let available = records
        .iter()
        .filter(|r| r.lidar_ttc.is_available() && r.camera_ttc.is_available())
        .count();
    info!(
        "Done! {} frames, {} records ({} with both estimates)",
        dataset.len(),
        records.len(),
        available
    );

    if let Some(path) = &args.output {
        write_records(path, &records)?;
        info!("Wrote {:?}", path);
    }

    Ok(())
}

fn report(result: &FrameResult, records: &mut Vec<TtcRecord>) {
    if result.records.is_empty() {
        info!("Frame {}: no matched objects", result.frame_index);
    }
    for record in &result.records {
        if record.lidar_ttc.is_available() || record.camera_ttc.is_available() {
            info!("{}", record);
        } else {
            warn!("{}", record);
        }
    }
    records.extend_from_slice(&result.records);
}
