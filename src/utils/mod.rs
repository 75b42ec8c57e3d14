//! Logging and plotting helpers for the demo binaries

pub mod logger;
pub mod visualization;

pub use logger::init_logger;
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
