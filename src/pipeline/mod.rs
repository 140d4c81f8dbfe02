// src/pipeline/mod.rs

pub mod event_bus;
pub mod frame_context;
pub mod metrics;
pub mod session;
pub mod tracker;

pub use event_bus::{EventBus, TrackerEvent};
pub use frame_context::FrameContext;
pub use metrics::{MetricsSummary, TrackerMetrics};
pub use session::{SessionConfig, TrackerSession};
pub use tracker::Tracker;
