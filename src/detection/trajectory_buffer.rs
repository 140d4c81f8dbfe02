// src/detection/trajectory_buffer.rs
//
// Turns the raw per-frame detections into smoothed speeds, a noise-filtered
// ball path and a rolling confidence score.
//
// Noise policy: the ball cannot teleport, cannot hop between orbits and
// cannot jump half the wheel between consecutive samples. Anything that
// breaks those rules zeroes the frame's path confidence, and a short run of
// missed detections wipes the history so a stale path is never extrapolated
// across a gap.

use super::smoother::{ConfidenceWindow, SpeedEstimate};
use super::types::{std_dev, wrap_angle, Observation, Point, PolarSample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

// ============================================================================
// HISTORY
// ============================================================================
const MAX_HISTORY: usize = 30;
const MAX_POLAR_SAMPLES: usize = 5;

// ============================================================================
// NOISE REJECTION
// ============================================================================
const REFERENCE_RADIUS: f64 = 240.0; // track radius of the 500x500 calibrated frame
const MAX_STEP_PX: f64 = 30.0;
const RADIAL_SOFT_RATIO: f64 = 0.05;
const RADIAL_HARD_RATIO: f64 = 0.15;
const MAX_ANGULAR_JUMP: f64 = 2.0;
const MAX_MISSED_FRAMES: u32 = 3;
const BALL_RADIUS_WINDOW: (f64, f64) = (0.3, 1.8);
const WHEEL_RADIUS_WINDOW: (f64, f64) = (0.3, 1.7);

// ============================================================================
// SPEED / CONFIDENCE
// ============================================================================
const MIN_VALID_DELTA: f64 = 0.005;
const MAX_VALID_DELTA: f64 = 3.0;
const SPEED_SMOOTHING: f64 = 0.8;
const SPEED_DECAY: f64 = 0.98;
const INITIAL_BALL_SPEED: f64 = 0.1;
const CONFIDENCE_WINDOW: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub max_history: usize,
    pub max_polar_samples: usize,
    /// Track radius the step threshold was tuned against.
    pub reference_radius: f64,
    /// Largest accepted jump between consecutive ball positions at the reference radius.
    pub max_step_px: f64,
    pub min_valid_delta: f64,
    pub max_valid_delta: f64,
    pub speed_smoothing: f64,
    pub speed_decay: f64,
    pub initial_ball_speed: f64,
    pub radial_soft_ratio: f64,
    pub radial_hard_ratio: f64,
    pub max_angular_jump: f64,
    pub max_missed_frames: u32,
    pub confidence_window: usize,
    /// Accepted ball distance from center, as multiples of the track radius.
    pub ball_radius_window: (f64, f64),
    pub wheel_radius_window: (f64, f64),
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            max_polar_samples: MAX_POLAR_SAMPLES,
            reference_radius: REFERENCE_RADIUS,
            max_step_px: MAX_STEP_PX,
            min_valid_delta: MIN_VALID_DELTA,
            max_valid_delta: MAX_VALID_DELTA,
            speed_smoothing: SPEED_SMOOTHING,
            speed_decay: SPEED_DECAY,
            initial_ball_speed: INITIAL_BALL_SPEED,
            radial_soft_ratio: RADIAL_SOFT_RATIO,
            radial_hard_ratio: RADIAL_HARD_RATIO,
            max_angular_jump: MAX_ANGULAR_JUMP,
            max_missed_frames: MAX_MISSED_FRAMES,
            confidence_window: CONFIDENCE_WINDOW,
            ball_radius_window: BALL_RADIUS_WINDOW,
            wheel_radius_window: WHEEL_RADIUS_WINDOW,
        }
    }
}

/// Why a frame's path confidence was reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPenalty {
    /// Position too far from the last accepted point; sample dropped.
    Teleport,
    /// Radius spread above the soft limit; confidence halved.
    RadialDrift,
    /// Radius spread above the hard limit.
    OrbitJump,
    /// Consecutive polar samples more than the jump limit apart.
    AngularJump,
    /// Ball not detected this frame.
    Missed,
}

/// What one observation did to the buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferUpdate {
    pub ball_found: bool,
    pub wheel_found: bool,
    /// Accepted ball angle for this frame.
    pub ball_angle: Option<f64>,
    pub wheel_angle: Option<f64>,
    pub path_confidence: f64,
    /// Value pushed into the confidence window.
    pub contribution: f64,
    pub penalty: Option<PathPenalty>,
    pub sample_accepted: bool,
    /// History was wiped because of consecutive misses.
    pub history_cleared: bool,
    pub motion_detected: bool,
}

#[derive(Debug, Clone, Copy)]
struct BallReading {
    angle: f64,
    position: Point,
    distance: f64,
}

pub struct TrajectoryBuffer {
    config: TrackingConfig,
    history: VecDeque<Point>,
    polar: VecDeque<PolarSample>,
    ball_speed: SpeedEstimate,
    wheel_speed: SpeedEstimate,
    confidence: ConfidenceWindow,
    missed_frames: u32,
    /// Set once real ball motion has been seen; sticky until reset.
    motion_detected: bool,
}

impl TrajectoryBuffer {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.max_history),
            polar: VecDeque::with_capacity(config.max_polar_samples),
            ball_speed: SpeedEstimate::gated(
                config.speed_smoothing,
                config.speed_decay,
                (config.min_valid_delta, config.max_valid_delta),
                config.initial_ball_speed,
            ),
            wheel_speed: SpeedEstimate::ungated(config.speed_smoothing),
            confidence: ConfidenceWindow::new(config.confidence_window),
            missed_frames: 0,
            motion_detected: false,
            config,
        }
    }

    /// Fold one (already validated) observation into the tracking state.
    pub fn update(&mut self, obs: &Observation) -> BufferUpdate {
        let wheel_angle = self.wheel_reading(obs);
        if let Some(angle) = wheel_angle {
            self.wheel_speed.observe(angle);
        }

        let ball = self.ball_reading(obs);
        let mut path_confidence = 1.0;
        let mut penalty = None;
        let mut sample_accepted = false;
        let mut history_cleared = false;
        let mut moved = false;

        match ball {
            Some(reading) => {
                self.missed_frames = 0;
                moved = self.ball_speed.observe(reading.angle);
                self.motion_detected |= moved;

                let max_step = self.max_step(obs.calibrated_radius);
                let teleported = self
                    .history
                    .back()
                    .map(|last| last.distance(reading.position) > max_step)
                    .unwrap_or(false);

                if teleported {
                    path_confidence = 0.0;
                    penalty = Some(PathPenalty::Teleport);
                } else {
                    self.push_sample(reading);
                    sample_accepted = true;
                }

                if let Some(p) = self.polar_penalty(obs.calibrated_radius) {
                    match p {
                        PathPenalty::RadialDrift => path_confidence *= 0.5,
                        _ => path_confidence = 0.0,
                    }
                    penalty = penalty.or(Some(p));
                }
            }
            None => {
                self.missed_frames += 1;
                if self.missed_frames >= self.config.max_missed_frames {
                    if !self.history.is_empty() || self.confidence.len() > 0 {
                        debug!(
                            "🧹 Ball lost for {} frames, clearing trajectory history",
                            self.missed_frames
                        );
                        history_cleared = true;
                    }
                    self.history.clear();
                    self.polar.clear();
                    self.confidence.clear();
                }
                path_confidence = 0.0;
                penalty = Some(PathPenalty::Missed);
            }
        }

        let ball_found = ball.is_some();
        let wheel_found = wheel_angle.is_some();
        let contribution = match (ball_found, wheel_found) {
            (true, true) => path_confidence,
            (true, false) | (false, true) => path_confidence * 0.5,
            (false, false) => 0.0,
        };
        self.confidence.push(contribution);

        BufferUpdate {
            ball_found,
            wheel_found,
            ball_angle: ball.map(|b| b.angle),
            wheel_angle,
            path_confidence,
            contribution,
            penalty,
            sample_accepted,
            history_cleared,
            motion_detected: moved,
        }
    }

    fn wheel_reading(&self, obs: &Observation) -> Option<f64> {
        if !obs.wheel_found {
            return None;
        }
        if let Some(pos) = obs.wheel_position {
            let dist = pos.distance(obs.calibrated_center);
            if !within(dist, obs.calibrated_radius, self.config.wheel_radius_window) {
                return None;
            }
        }
        obs.wheel_angle.or_else(|| {
            obs.wheel_position
                .map(|p| p.angle_around(obs.calibrated_center))
        })
    }

    fn ball_reading(&self, obs: &Observation) -> Option<BallReading> {
        if !obs.ball_found {
            return None;
        }
        let center = obs.calibrated_center;
        let (angle, position) = match (obs.ball_angle, obs.ball_position) {
            (Some(a), Some(p)) => (a, p),
            (None, Some(p)) => (p.angle_around(center), p),
            (Some(a), None) => (a, Point::on_circle(center, obs.calibrated_radius, a)),
            (None, None) => return None,
        };
        let distance = position.distance(center);
        if obs.ball_position.is_some()
            && !within(distance, obs.calibrated_radius, self.config.ball_radius_window)
        {
            return None;
        }
        Some(BallReading {
            angle,
            position,
            distance,
        })
    }

    fn push_sample(&mut self, reading: BallReading) {
        self.history.push_back(reading.position);
        if self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
        self.polar.push_back(PolarSample {
            angle: reading.angle,
            radius: reading.distance,
        });
        if self.polar.len() > self.config.max_polar_samples {
            self.polar.pop_front();
        }
    }

    /// Radial stability and angular continuity over the recent polar samples.
    fn polar_penalty(&self, track_radius: f64) -> Option<PathPenalty> {
        if self.polar.len() < 2 {
            return None;
        }
        let radii: Vec<f64> = self.polar.iter().map(|p| p.radius).collect();
        let spread = std_dev(&radii);

        let max_jump = self
            .polar
            .iter()
            .zip(self.polar.iter().skip(1))
            .map(|(a, b)| wrap_angle(b.angle - a.angle).abs())
            .fold(0.0, f64::max);

        if max_jump > self.config.max_angular_jump {
            Some(PathPenalty::AngularJump)
        } else if spread > track_radius * self.config.radial_hard_ratio {
            Some(PathPenalty::OrbitJump)
        } else if spread > track_radius * self.config.radial_soft_ratio {
            Some(PathPenalty::RadialDrift)
        } else {
            None
        }
    }

    fn max_step(&self, track_radius: f64) -> f64 {
        self.config.max_step_px * track_radius / self.config.reference_radius
    }

    /// Drop path history (spin finished). Speeds and confidence carry over.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.polar.clear();
        self.missed_frames = 0;
    }

    pub fn reset(&mut self) {
        self.clear_history();
        self.ball_speed.reset();
        self.wheel_speed.reset();
        self.confidence.clear();
        self.motion_detected = false;
    }

    pub fn history(&self) -> &VecDeque<Point> {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn polar_len(&self) -> usize {
        self.polar.len()
    }

    /// Rolling confidence, 0..=100.
    pub fn confidence(&self) -> f64 {
        self.confidence.percent()
    }

    pub fn ball_speed(&self) -> f64 {
        self.ball_speed.speed()
    }

    pub fn wheel_speed(&self) -> f64 {
        self.wheel_speed.speed()
    }

    pub fn last_ball_angle(&self) -> Option<f64> {
        self.ball_speed.last_angle()
    }

    pub fn last_wheel_angle(&self) -> Option<f64> {
        self.wheel_speed.last_angle()
    }

    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    pub fn motion_detected(&self) -> bool {
        self.motion_detected
    }
}

fn within(distance: f64, radius: f64, window: (f64, f64)) -> bool {
    distance > radius * window.0 && distance < radius * window.1
}
