// src/analysis/arc_validator.rs
//
// Decides whether the most recent ball samples look like a ball that is
// really orbiting the track and slowing down. Physics extrapolation is only
// worth running on such an arc.

use crate::detection::{std_dev, wrap_angle, Point};
use serde::{Deserialize, Serialize};

const ARC_WINDOW: usize = 10;
const MIN_DECLINING_RATIO: f64 = 0.6;
const RADIAL_STD_RATIO: f64 = 0.08;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcConfig {
    /// Number of trailing samples examined.
    pub window: usize,
    /// Share of velocity-to-velocity differences that must be negative.
    pub min_declining_ratio: f64,
    /// Radius std limit as a fraction of the track radius.
    pub radial_std_ratio: f64,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            window: ARC_WINDOW,
            min_declining_ratio: MIN_DECLINING_RATIO,
            radial_std_ratio: RADIAL_STD_RATIO,
        }
    }
}

/// Per-criterion breakdown, mostly for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcAssessment {
    pub declining_ratio: f64,
    pub radial_std: f64,
    pub is_declining: bool,
    pub is_circular: bool,
    pub is_monotonic: bool,
}

impl ArcAssessment {
    pub fn is_consistent(&self) -> bool {
        self.is_declining && self.is_circular && self.is_monotonic
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArcConsistencyValidator {
    config: ArcConfig,
}

impl ArcConsistencyValidator {
    pub fn new(config: ArcConfig) -> Self {
        Self { config }
    }

    /// Assess the trailing `window` points. None when there are too few.
    pub fn assess(
        &self,
        points: &[Point],
        center: Point,
        track_radius: f64,
    ) -> Option<ArcAssessment> {
        let window = self.config.window.max(3);
        if points.len() < window {
            return None;
        }
        let recent = &points[points.len() - window..];

        // Step sizes between consecutive samples
        let velocities: Vec<f64> = recent.windows(2).map(|w| w[0].distance(w[1])).collect();
        let declining = velocities.windows(2).filter(|w| w[1] - w[0] < 0.0).count();
        let diffs = velocities.len() - 1;
        let declining_ratio = declining as f64 / diffs as f64;
        let is_declining = declining as f64 >= diffs as f64 * self.config.min_declining_ratio;

        let radii: Vec<f64> = recent.iter().map(|p| p.distance(center)).collect();
        let radial_std = std_dev(&radii);
        let is_circular = radial_std < track_radius * self.config.radial_std_ratio;

        let deltas: Vec<f64> = recent
            .windows(2)
            .map(|w| wrap_angle(w[1].angle_around(center) - w[0].angle_around(center)))
            .collect();
        let is_monotonic = deltas.iter().all(|d| *d > 0.0) || deltas.iter().all(|d| *d < 0.0);

        Some(ArcAssessment {
            declining_ratio,
            radial_std,
            is_declining,
            is_circular,
            is_monotonic,
        })
    }

    pub fn is_consistent(&self, points: &[Point], center: Point, track_radius: f64) -> bool {
        self.assess(points, center, track_radius)
            .map(|a| a.is_consistent())
            .unwrap_or(false)
    }

    pub fn window(&self) -> usize {
        self.config.window
    }
}
