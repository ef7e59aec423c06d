pub mod config;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod lidar;
pub mod pipeline;
pub mod stats;
pub mod system;
pub mod tracking;
pub mod ttc;
