// src/detection/types.rs
//
// Per-frame input handed over by the external detector, plus the small
// amount of planar/angular math shared by the tracking and analysis stages.

use crate::errors::TrackerError;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Angle of this point around `center`, atan2 convention.
    pub fn angle_around(&self, center: Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x)
    }

    pub fn on_circle(center: Point, radius: f64, angle: f64) -> Self {
        Self {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    }
}

/// Polar sample of the ball relative to the calibrated center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarSample {
    pub angle: f64,
    pub radius: f64,
}

/// One processed frame as reported by the detector.
///
/// Angles are radians around `calibrated_center`. Positions are in the
/// calibrated (flattened) frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub ball_angle: Option<f64>,
    #[serde(default)]
    pub ball_found: bool,
    #[serde(default)]
    pub ball_position: Option<Point>,
    #[serde(default)]
    pub wheel_angle: Option<f64>,
    #[serde(default)]
    pub wheel_found: bool,
    /// Position of the wheel marker, when the detector reports it.
    #[serde(default)]
    pub wheel_position: Option<Point>,
    /// Seconds since the previous frame.
    pub frame_dt: f64,
    pub calibrated_center: Point,
    pub calibrated_radius: f64,
}

impl Observation {
    /// A frame in which nothing was detected.
    pub fn empty(frame_dt: f64, center: Point, radius: f64) -> Self {
        Self {
            ball_angle: None,
            ball_found: false,
            ball_position: None,
            wheel_angle: None,
            wheel_found: false,
            wheel_position: None,
            frame_dt,
            calibrated_center: center,
            calibrated_radius: radius,
        }
    }

    /// Ball seen at `angle`, `distance` away from the calibrated center.
    pub fn with_ball(mut self, angle: f64, distance: f64) -> Self {
        self.ball_found = true;
        self.ball_angle = Some(angle);
        self.ball_position = Some(Point::on_circle(self.calibrated_center, distance, angle));
        self
    }

    pub fn with_ball_position(mut self, position: Point) -> Self {
        self.ball_found = true;
        self.ball_angle = Some(position.angle_around(self.calibrated_center));
        self.ball_position = Some(position);
        self
    }

    pub fn with_wheel(mut self, angle: f64) -> Self {
        self.wheel_found = true;
        self.wheel_angle = Some(angle);
        self
    }

    /// Reject values that would silently poison the speed and history state.
    pub fn validate(&self) -> Result<(), TrackerError> {
        check_finite("frame_dt", self.frame_dt)?;
        if self.frame_dt < 0.0 {
            return Err(TrackerError::MalformedObservation {
                field: "frame_dt",
                value: self.frame_dt,
            });
        }
        check_finite("calibrated_radius", self.calibrated_radius)?;
        if self.calibrated_radius <= 0.0 {
            return Err(TrackerError::MalformedObservation {
                field: "calibrated_radius",
                value: self.calibrated_radius,
            });
        }
        check_finite("calibrated_center.x", self.calibrated_center.x)?;
        check_finite("calibrated_center.y", self.calibrated_center.y)?;
        if let Some(a) = self.ball_angle {
            check_finite("ball_angle", a)?;
        }
        if let Some(a) = self.wheel_angle {
            check_finite("wheel_angle", a)?;
        }
        if let Some(p) = self.ball_position {
            check_finite("ball_position.x", p.x)?;
            check_finite("ball_position.y", p.y)?;
        }
        if let Some(p) = self.wheel_position {
            check_finite("wheel_position.x", p.x)?;
            check_finite("wheel_position.y", p.y)?;
        }
        Ok(())
    }

    /// Frames per second implied by `frame_dt`; 60 when the delta is unusable.
    pub fn fps(&self) -> f64 {
        if self.frame_dt > 0.0 {
            1.0 / self.frame_dt
        } else {
            60.0
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), TrackerError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrackerError::MalformedObservation { field, value })
    }
}

/// Wrap an angular difference into (-PI, PI].
pub fn wrap_angle(delta: f64) -> f64 {
    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Normalize an absolute angle into [0, TAU).
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Mean direction of a set of angles. Unlike an arithmetic mean this does
/// not break when the samples straddle the +-PI seam.
pub fn circular_mean<I: IntoIterator<Item = f64>>(angles: I) -> Option<f64> {
    let (mut s, mut c, mut n) = (0.0_f64, 0.0_f64, 0usize);
    for a in angles {
        s += a.sin();
        c += a.cos();
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(s.atan2(c))
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Angular speed (rad/frame) to revolutions per minute.
pub fn speed_to_rpm(speed: f64, fps: f64) -> f64 {
    (speed * fps * 60.0 / TAU).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_angle_range() {
        assert_relative_eq!(wrap_angle(0.1), 0.1, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(TAU - 0.1), -0.1, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-TAU + 0.1), 0.1, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_circular_mean_across_seam() {
        let mean = circular_mean([PI - 0.05, -PI + 0.05]).unwrap();
        assert!(mean.abs() > 3.0, "mean {} should sit near +-PI, not 0", mean);
        assert!(circular_mean(std::iter::empty()).is_none());
    }

    #[test]
    fn test_population_std() {
        assert_relative_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let obs = Observation::empty(1.0 / 60.0, Point::new(250.0, 250.0), 240.0)
            .with_ball(f64::NAN, 200.0);
        assert!(matches!(
            obs.validate(),
            Err(TrackerError::MalformedObservation { field: "ball_angle", .. })
        ));

        let obs = Observation::empty(-0.1, Point::new(250.0, 250.0), 240.0);
        assert!(obs.validate().is_err());

        let obs = Observation::empty(1.0 / 60.0, Point::new(250.0, 250.0), 0.0);
        assert!(obs.validate().is_err());
    }

    #[test]
    fn test_rpm_conversion() {
        // one full turn per second at 60 fps
        assert_relative_eq!(speed_to_rpm(TAU / 60.0, 60.0), 60.0, epsilon = 1e-9);
    }
}
