//! Threaded wrapper around the frame pipeline.
//!
//! [`FusionSystem`] owns a worker thread that runs a
//! [`TtcPipeline`](crate::pipeline::TtcPipeline). Frames are handed over a
//! bounded channel and results come back on a second channel; the worker is
//! the only writer of the [`SharedState`] snapshot, other threads only read it.

pub mod messages;
pub mod shared_state;
mod fusion_system;

pub use fusion_system::FusionSystem;
pub use messages::{FrameResult, WorkerMsg};
pub use shared_state::SharedState;
