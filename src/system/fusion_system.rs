//! Fusion system: worker thread lifecycle and frame hand-off.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use tracing::{debug, info};

use crate::config::FusionConfig;
use crate::frame::Frame;
use crate::geometry::ProjectionChain;
use crate::pipeline::TtcPipeline;

use super::messages::{FrameResult, WorkerMsg};
use super::shared_state::SharedState;

/// Capacity of the frame channel. When full, [`FusionSystem::submit`] blocks.
const FRAME_CHANNEL_CAPACITY: usize = 4;

/// Runs the TTC pipeline on a dedicated worker thread.
pub struct FusionSystem {
    /// Progress and kinematic snapshot, written by the worker only.
    shared: Arc<SharedState>,

    /// Frames (caller -> worker). `None` once the system is shut down.
    frame_sender: Option<Sender<WorkerMsg>>,

    /// Per-frame results (worker -> caller).
    result_receiver: Receiver<FrameResult>,

    /// Handle to the worker thread.
    worker_handle: Option<JoinHandle<()>>,
}

impl FusionSystem {
    /// Validate the configuration and spawn the worker.
    pub fn new(config: FusionConfig, chain: ProjectionChain) -> Result<Self> {
        config.validate()?;

        let shared = SharedState::new();

        // Bounded frame queue applies backpressure to the loader
        let (frame_sender, frame_receiver) = bounded::<WorkerMsg>(FRAME_CHANNEL_CAPACITY);
        let (result_sender, result_receiver) = unbounded::<FrameResult>();

        let pipeline = TtcPipeline::new(config, chain);
        let worker_handle = Self::spawn_worker(pipeline, shared.clone(), frame_receiver, result_sender)?;

        Ok(Self {
            shared,
            frame_sender: Some(frame_sender),
            result_receiver,
            worker_handle: Some(worker_handle),
        })
    }

    fn spawn_worker(
        mut pipeline: TtcPipeline,
        shared: Arc<SharedState>,
        frames: Receiver<WorkerMsg>,
        results: Sender<FrameResult>,
    ) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("ttc-pipeline".into())
            .spawn(move || {
                for msg in frames {
                    if shared.is_shutdown_requested() {
                        break;
                    }
                    match msg {
                        WorkerMsg::Frame(frame) => {
                            // Run the pipeline, then publish before handing results back
                            let frame_index = frame.index;
                            let records = pipeline.process_frame(*frame);
                            let state = pipeline.kinematic_state();
                            shared.publish_kinematics(state);
                            shared.record_frame(records.len());

                            let result = FrameResult {
                                frame_index,
                                records,
                                state,
                            };
                            if results.send(result).is_err() {
                                // Caller dropped the receiver.
                                break;
                            }
                        }
                        WorkerMsg::Reset => {
                            pipeline.reset();
                            shared.publish_kinematics(pipeline.kinematic_state());
                            debug!("Pipeline reset");
                        }
                    }
                }
                debug!("Pipeline worker exiting");
            })
            .context("Failed to spawn pipeline worker")
    }

    fn sender(&self) -> Result<&Sender<WorkerMsg>> {
        self.frame_sender
            .as_ref()
            .ok_or_else(|| anyhow!("Fusion system is shut down"))
    }

    /// Queue a frame for processing. Blocks while the queue is full.
    pub fn submit(&self, frame: Frame) -> Result<()> {
        self.sender()?
            .send(WorkerMsg::Frame(Box::new(frame)))
            .map_err(|_| anyhow!("Pipeline worker has stopped"))
    }

    /// Start a new run: the next frame is treated as the first one.
    pub fn reset(&self) -> Result<()> {
        self.sender()?
            .send(WorkerMsg::Reset)
            .map_err(|_| anyhow!("Pipeline worker has stopped"))
    }

    /// Results produced so far, without blocking.
    pub fn try_results(&self) -> Vec<FrameResult> {
        self.result_receiver.try_iter().collect()
    }

    /// Block until the next result arrives.
    pub fn recv_result(&self) -> Result<FrameResult> {
        self.result_receiver
            .recv()
            .map_err(|_| anyhow!("Pipeline worker has stopped"))
    }

    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Process every queued frame, stop the worker and return the
    /// results not yet received.
    pub fn finish(mut self) -> Result<Vec<FrameResult>> {
        // Closing the channel ends the worker loop after the queue drains.
        self.frame_sender = None;
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("Pipeline worker panicked"))?;
        }
        info!(
            "Fusion system finished: {} frames, {} records",
            self.shared.frames_processed(),
            self.shared.records_emitted()
        );
        Ok(self.result_receiver.try_iter().collect())
    }

    /// Stop the worker without processing the remaining queue.
    pub fn shutdown(&mut self) {
        self.shared.request_shutdown();
        self.frame_sender = None;
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FusionSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ObjectId;
    use crate::geometry::PixelRect;
    use crate::lidar::RangePoint;
    use crate::ttc::{KinematicState, TtcModel};
    use approx::assert_relative_eq;
    use nalgebra::Matrix3x4;

    fn chain() -> ProjectionChain {
        ProjectionChain::from_matrix(Matrix3x4::new(
            600.0, -700.0, 0.0, 0.0, //
            200.0, 0.0, -700.0, 0.0, //
            1.0, 0.0, 0.0, 0.0,
        ))
    }

    fn frame(index: usize, x: f64) -> Frame {
        let points = (0..10)
            .map(|i| RangePoint::new(x, -0.2 + 0.05 * i as f64, -1.1, 0.5))
            .collect();
        Frame::new(
            index,
            vec![(ObjectId(1), PixelRect::new(400.0, 150.0, 400.0, 260.0))],
            points,
            Vec::new(),
            Vec::new(),
        )
    }

    fn ca_config() -> FusionConfig {
        FusionConfig {
            model: TtcModel::ConstantAcceleration,
            ..Default::default()
        }
    }

    #[test]
    fn test_frames_processed_in_order() {
        let system = FusionSystem::new(ca_config(), chain()).unwrap();
        for (i, x) in [10.0, 9.0, 7.5].into_iter().enumerate() {
            system.submit(frame(i, x)).unwrap();
        }

        let results = system.finish().unwrap();

        let indices: Vec<_> = results.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(results[0].records.is_empty());
        assert_relative_eq!(results[1].records[0].lidar_ttc.seconds().unwrap(), 0.9, epsilon = 1e-9);
        assert_relative_eq!(results[2].records[0].lidar_ttc.seconds().unwrap(), 0.5, epsilon = 1e-9);
        assert!(results[2].state.acceleration().is_some());
    }

    #[test]
    fn test_shared_snapshot_follows_worker() {
        let system = FusionSystem::new(ca_config(), chain()).unwrap();
        system.submit(frame(0, 10.0)).unwrap();
        system.submit(frame(1, 9.0)).unwrap();

        system.recv_result().unwrap();
        let second = system.recv_result().unwrap();

        let shared = system.shared_state();
        assert_eq!(shared.frames_processed(), 2);
        assert_eq!(shared.records_emitted(), 1);
        assert_eq!(shared.kinematic_snapshot(), second.state);
        assert_relative_eq!(second.state.velocity().unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_starts_new_run() {
        let system = FusionSystem::new(ca_config(), chain()).unwrap();
        system.submit(frame(0, 10.0)).unwrap();
        system.submit(frame(1, 9.0)).unwrap();
        system.reset().unwrap();
        system.submit(frame(0, 20.0)).unwrap();

        let results = system.finish().unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[2].records.is_empty());
        assert_eq!(results[2].state, KinematicState::Uninitialized);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FusionConfig {
            frame_rate: -1.0,
            ..Default::default()
        };
        assert!(FusionSystem::new(config, chain()).is_err());
    }
}
