// src/pipeline/frame_context.rs
//
// Read-only snapshot of the tracking state after one observation has been
// folded in. The lifecycle decides everything from this snapshot and never
// reaches into the trajectory buffer directly.

use crate::detection::{BufferUpdate, Observation, Point, TrajectoryBuffer};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FrameContext<'a> {
    pub frame_index: u64,
    /// Seconds since the tracker started, accumulated from frame deltas.
    pub now: f64,

    pub ball_found: bool,
    pub wheel_found: bool,
    /// Ball angle accepted on this frame.
    pub ball_angle: Option<f64>,
    /// Wheel marker angle accepted on this frame.
    pub wheel_angle: Option<f64>,

    // rad/frame
    pub ball_speed: f64,
    pub wheel_speed: f64,
    pub ball_rpm: f64,
    pub wheel_rpm: f64,

    /// Rolling confidence, 0..=100.
    pub confidence: f64,
    pub history: &'a VecDeque<Point>,
    pub center: Point,
    pub track_radius: f64,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        frame_index: u64,
        now: f64,
        obs: &Observation,
        update: &BufferUpdate,
        buffer: &'a TrajectoryBuffer,
        ball_rpm: f64,
        wheel_rpm: f64,
    ) -> Self {
        Self {
            frame_index,
            now,
            ball_found: update.ball_found,
            wheel_found: update.wheel_found,
            ball_angle: update.ball_angle,
            wheel_angle: update.wheel_angle,
            ball_speed: buffer.ball_speed(),
            wheel_speed: buffer.wheel_speed(),
            ball_rpm,
            wheel_rpm,
            confidence: buffer.confidence(),
            history: buffer.history(),
            center: obs.calibrated_center,
            track_radius: obs.calibrated_radius,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The trailing `n` accepted ball positions, oldest first.
    pub fn recent_points(&self, n: usize) -> Vec<Point> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }
}
