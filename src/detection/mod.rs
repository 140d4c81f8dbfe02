// src/detection/mod.rs

mod smoother;
mod trajectory_buffer;
mod types;

// Re-export public APIs
pub use smoother::{ConfidenceWindow, SpeedEstimate};
pub use trajectory_buffer::{BufferUpdate, PathPenalty, TrackingConfig, TrajectoryBuffer};
pub use types::*;
