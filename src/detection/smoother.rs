// src/detection/smoother.rs

use super::types::wrap_angle;
use std::collections::VecDeque;

/// Exponentially smoothed angular speed (rad/frame) for one tracked object.
///
/// The ball estimator is *gated*: only deltas inside the plausible motion
/// window feed the average, anything else (jitter, wrap artifacts) decays it.
/// The wheel marker estimator accepts every delta.
#[derive(Debug, Clone)]
pub struct SpeedEstimate {
    speed: f64,
    last_angle: Option<f64>,
    smoothing: f64,
    decay: f64,
    valid_window: Option<(f64, f64)>,
    initial_speed: Option<f64>,
}

impl SpeedEstimate {
    /// Estimator that only trusts deltas with `min < |delta| < max`.
    ///
    /// # Arguments
    /// * `smoothing` - Weight kept from the previous speed (e.g. 0.8)
    /// * `decay` - Multiplier applied when a delta is rejected (e.g. 0.98)
    /// * `window` - Exclusive bounds on |delta| counted as real motion
    /// * `initial_speed` - Seed used on the first angle after a reset
    pub fn gated(smoothing: f64, decay: f64, window: (f64, f64), initial_speed: f64) -> Self {
        Self {
            speed: 0.0,
            last_angle: None,
            smoothing,
            decay,
            valid_window: Some(window),
            initial_speed: Some(initial_speed),
        }
    }

    pub fn ungated(smoothing: f64) -> Self {
        Self {
            speed: 0.0,
            last_angle: None,
            smoothing,
            decay: 1.0,
            valid_window: None,
            initial_speed: None,
        }
    }

    /// Feed a new absolute angle. Returns true when the delta counted as motion.
    pub fn observe(&mut self, angle: f64) -> bool {
        let moved = match self.last_angle {
            Some(prev) => {
                let delta = wrap_angle(angle - prev).abs();
                match self.valid_window {
                    Some((min, max)) if !(delta > min && delta < max) => {
                        self.speed *= self.decay;
                        false
                    }
                    _ => {
                        self.speed = self.speed * self.smoothing + delta * (1.0 - self.smoothing);
                        self.valid_window.is_some()
                    }
                }
            }
            None => {
                if let Some(seed) = self.initial_speed {
                    self.speed = seed;
                }
                false
            }
        };
        self.last_angle = Some(angle);
        moved
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn last_angle(&self) -> Option<f64> {
        self.last_angle
    }

    pub fn reset(&mut self) {
        self.speed = 0.0;
        self.last_angle = None;
    }
}

/// Running mean over the last `capacity` per-frame confidence contributions.
#[derive(Debug, Clone)]
pub struct ConfidenceWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl ConfidenceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, contribution: f64) {
        self.values.push_back(contribution.clamp(0.0, 1.0));
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Mean contribution as a percentage, 0 when empty.
    pub fn percent(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64 * 100.0
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ball_estimator() -> SpeedEstimate {
        SpeedEstimate::gated(0.8, 0.98, (0.005, 3.0), 0.1)
    }

    #[test]
    fn test_first_ball_angle_seeds_speed() {
        let mut est = ball_estimator();
        assert!(!est.observe(1.0));
        assert_relative_eq!(est.speed(), 0.1);
    }

    #[test]
    fn test_valid_delta_is_smoothed() {
        let mut est = ball_estimator();
        est.observe(0.0);
        assert!(est.observe(0.2));
        assert_relative_eq!(est.speed(), 0.1 * 0.8 + 0.2 * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_jitter_decays_instead_of_smoothing() {
        let mut est = ball_estimator();
        est.observe(0.0);
        assert!(!est.observe(0.001), "sub-threshold jitter is not motion");
        assert_relative_eq!(est.speed(), 0.098, epsilon = 1e-12);
    }

    #[test]
    fn test_delta_is_wrapped_across_seam() {
        let mut est = ball_estimator();
        est.observe(std::f64::consts::PI - 0.05);
        assert!(est.observe(-std::f64::consts::PI + 0.05));
        assert_relative_eq!(est.speed(), 0.1 * 0.8 + 0.1 * 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_wheel_estimator_accepts_tiny_deltas() {
        let mut est = SpeedEstimate::ungated(0.8);
        est.observe(0.0);
        assert_eq!(est.speed(), 0.0);
        est.observe(0.001);
        assert_relative_eq!(est.speed(), 0.0002, epsilon = 1e-12);
    }

    #[test]
    fn test_confidence_window_rolls() {
        let mut window = ConfidenceWindow::new(3);
        assert_eq!(window.percent(), 0.0);
        window.push(1.0);
        window.push(0.5);
        window.push(0.0);
        assert_relative_eq!(window.percent(), 50.0);
        window.push(1.0);
        assert_eq!(window.len(), 3);
        assert_relative_eq!(window.percent(), 50.0);
    }
}
