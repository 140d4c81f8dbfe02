// src/pipeline/metrics.rs
//
// Counters for one tracker instance. Cloning shares the counters, so a
// session can hand a handle to a reporter while the tracker task owns the
// tracker itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TrackerMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_ball: Arc<AtomicU64>,
    pub frames_with_wheel: Arc<AtomicU64>,
    pub rejected_samples: Arc<AtomicU64>,
    pub zero_confidence_frames: Arc<AtomicU64>,
    pub history_resets: Arc<AtomicU64>,
    pub spins_started: Arc<AtomicU64>,
    pub predictions_made: Arc<AtomicU64>,
    pub spins_finished: Arc<AtomicU64>,
    pub unknown_actuals: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_ball: Arc::new(AtomicU64::new(0)),
            frames_with_wheel: Arc::new(AtomicU64::new(0)),
            rejected_samples: Arc::new(AtomicU64::new(0)),
            zero_confidence_frames: Arc::new(AtomicU64::new(0)),
            history_resets: Arc::new(AtomicU64::new(0)),
            spins_started: Arc::new(AtomicU64::new(0)),
            predictions_made: Arc::new(AtomicU64::new(0)),
            spins_finished: Arc::new(AtomicU64::new(0)),
            unknown_actuals: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Wall-clock processing rate.
    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            frames_with_ball: self.frames_with_ball.load(Ordering::Relaxed),
            frames_with_wheel: self.frames_with_wheel.load(Ordering::Relaxed),
            rejected_samples: self.rejected_samples.load(Ordering::Relaxed),
            zero_confidence_frames: self.zero_confidence_frames.load(Ordering::Relaxed),
            history_resets: self.history_resets.load(Ordering::Relaxed),
            spins_started: self.spins_started.load(Ordering::Relaxed),
            predictions_made: self.predictions_made.load(Ordering::Relaxed),
            spins_finished: self.spins_finished.load(Ordering::Relaxed),
            unknown_actuals: self.unknown_actuals.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_with_ball: u64,
    pub frames_with_wheel: u64,
    pub rejected_samples: u64,
    pub zero_confidence_frames: u64,
    pub history_resets: u64,
    pub spins_started: u64,
    pub predictions_made: u64,
    pub spins_finished: u64,
    pub unknown_actuals: u64,
    pub elapsed_secs: f64,
}
