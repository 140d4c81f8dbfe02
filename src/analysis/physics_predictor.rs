// src/analysis/physics_predictor.rs
//
// Forward simulation of the ball and wheel until the ball drops into a
// pocket. The coupled friction / centrifugal / gravity terms have no useful
// closed form, so the motion is stepped frame by frame with empirically tuned
// constants. The simulation is fully deterministic: identical inputs always
// land in the identical pocket, which is what makes majority voting over
// slightly different input snapshots meaningful.

use crate::detection::normalize_angle;
use crate::interface::PocketPredictor;
use crate::pocket_ring::{Pocket, PocketRing, POCKET_COUNT};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

// ============================================================================
// SIMULATION CONSTANTS
// ============================================================================
const MAX_STEPS: usize = 5000;
const WHEEL_FRICTION: f64 = 0.9985;
const BALL_FRICTION: f64 = 0.996;
const GRAVITY: f64 = 0.012;
const CENTRIFUGAL_GAIN: f64 = 0.0008;

// ============================================================================
// ORBIT / LOCK
// ============================================================================
const INITIAL_DISTANCE: f64 = 5.1;
const MIN_DISTANCE: f64 = 4.0;
const LOCK_DISTANCE: f64 = 4.3;
const LOCK_SPEED_DELTA: f64 = 0.008;

const ENSEMBLE_RUNS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub max_steps: usize,
    /// Per-step speed multiplier for the wheel.
    pub wheel_friction: f64,
    /// Per-step speed multiplier for the ball.
    pub ball_friction: f64,
    pub gravity: f64,
    pub centrifugal_gain: f64,
    /// Orbital distance-from-center scalar at the start of the simulation.
    pub initial_distance: f64,
    pub min_distance: f64,
    pub lock_distance: f64,
    pub lock_speed_delta: f64,
    /// Predictor calls per committed prediction.
    pub ensemble_runs: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            wheel_friction: WHEEL_FRICTION,
            ball_friction: BALL_FRICTION,
            gravity: GRAVITY,
            centrifugal_gain: CENTRIFUGAL_GAIN,
            initial_distance: INITIAL_DISTANCE,
            min_distance: MIN_DISTANCE,
            lock_distance: LOCK_DISTANCE,
            lock_speed_delta: LOCK_SPEED_DELTA,
            ensemble_runs: ENSEMBLE_RUNS,
        }
    }
}

/// Speed (rad/frame) and angle (rad) snapshot handed to a predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kinematics {
    pub wheel_speed: f64,
    pub ball_speed: f64,
    pub wheel_angle: f64,
    pub ball_angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOutcome {
    pub pocket: Pocket,
    pub steps: usize,
    /// Ball settled with the wheel before the step budget ran out.
    pub locked: bool,
    /// Final ball angle relative to the wheel, in [0, TAU).
    pub relative_angle: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsPredictor {
    config: PhysicsConfig,
}

impl PhysicsPredictor {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn simulate(&self, k: &Kinematics) -> SimulationOutcome {
        let c = &self.config;
        let (mut sw, mut sb) = (k.wheel_speed.abs(), k.ball_speed.abs());
        let (mut wa, mut ba) = (k.wheel_angle, k.ball_angle);
        let mut dist = c.initial_distance;
        let mut locked = false;
        let mut steps = 0;

        while steps < c.max_steps {
            steps += 1;
            wa += sw;
            ba += sb;

            sw *= c.wheel_friction;
            sb *= c.ball_friction;

            let centrifugal = sb * sb * dist * c.centrifugal_gain;
            dist += centrifugal - c.gravity;
            dist = dist.max(c.min_distance);

            // Ball has dropped and moves with the wheel
            if dist < c.lock_distance && (sb - sw).abs() < c.lock_speed_delta {
                locked = true;
                break;
            }
        }

        let relative_angle = normalize_angle(ba - wa);
        SimulationOutcome {
            pocket: sector_pocket(relative_angle),
            steps,
            locked,
            relative_angle,
        }
    }

    pub fn predict(
        &self,
        wheel_speed: f64,
        ball_speed: f64,
        wheel_angle: f64,
        ball_angle: f64,
    ) -> Pocket {
        self.simulate(&Kinematics {
            wheel_speed,
            ball_speed,
            wheel_angle,
            ball_angle,
        })
        .pocket
    }

    pub fn ensemble_runs(&self) -> usize {
        self.config.ensemble_runs
    }
}

impl PocketPredictor for PhysicsPredictor {
    fn predict(&self, kinematics: &Kinematics) -> Pocket {
        self.simulate(kinematics).pocket
    }
}

/// Nearest of the 38 equal sectors for a wheel-relative angle.
pub fn sector_pocket(relative_angle: f64) -> Pocket {
    let sector = TAU / POCKET_COUNT as f64;
    let idx = (normalize_angle(relative_angle) / sector + 0.5).floor() as usize % POCKET_COUNT;
    PocketRing::label_at(idx)
}

/// Run `predictor` `runs` times and keep the most frequent pocket. Ties go to
/// the pocket that was produced first.
pub fn majority_vote(
    predictor: &dyn PocketPredictor,
    kinematics: &Kinematics,
    runs: usize,
) -> Option<Pocket> {
    let mut votes: Vec<(Pocket, usize)> = Vec::new();
    for _ in 0..runs {
        let pocket = predictor.predict(kinematics);
        match votes.iter_mut().find(|(p, _)| *p == pocket) {
            Some((_, n)) => *n += 1,
            None => votes.push((pocket, 1)),
        }
    }
    let best = votes.iter().map(|(_, n)| *n).max()?;
    votes.into_iter().find(|(_, n)| *n == best).map(|(p, _)| p)
}
