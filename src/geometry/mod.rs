//! Geometry utilities: pixel rectangles, lidar-to-image projection.

pub mod projection;
pub mod rect;

pub use projection::ProjectionChain;
pub use rect::PixelRect;
