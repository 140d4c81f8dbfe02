// src/lib.rs
//
// Roulette ball/wheel tracker: per-frame trajectory tracking, a physics
// drop predictor and the spin lifecycle that ties them together.

pub mod analysis;
pub mod config;
pub mod detection;
pub mod errors;
pub mod interface;
pub mod pipeline;
pub mod pocket_ring;
pub mod types;

pub use errors::{RingError, SessionError, TrackerError};
pub use pipeline::{Tracker, TrackerSession};
pub use pocket_ring::{Pocket, PocketRing};
pub use types::{ActualOutcome, Config, FrameResult, Prediction, SpinRecord};
