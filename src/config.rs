// src/config.rs

use crate::types::Config;
use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the tracker misbehave silently.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracking;
        ensure!(t.max_history > 0, "tracking.max_history must be positive");
        ensure!(t.reference_radius > 0.0, "tracking.reference_radius must be positive");
        ensure!(
            t.min_valid_delta < t.max_valid_delta,
            "tracking.min_valid_delta must be below max_valid_delta"
        );
        ensure!(
            (0.0..=1.0).contains(&t.speed_smoothing) && (0.0..=1.0).contains(&t.speed_decay),
            "tracking smoothing factors must lie in [0, 1]"
        );
        ensure!(
            t.radial_soft_ratio <= t.radial_hard_ratio,
            "tracking.radial_soft_ratio must not exceed radial_hard_ratio"
        );
        ensure!(
            t.ball_radius_window.0 < t.ball_radius_window.1
                && t.wheel_radius_window.0 < t.wheel_radius_window.1,
            "tracking radius windows must be (min, max) with min < max"
        );
        ensure!(t.confidence_window > 0, "tracking.confidence_window must be positive");

        ensure!(self.arc.window >= 3, "arc.window needs at least 3 points");

        let p = &self.physics;
        ensure!(p.max_steps > 0, "physics.max_steps must be positive");
        ensure!(
            p.min_distance < p.lock_distance && p.lock_distance < p.initial_distance,
            "physics distances must satisfy min < lock < initial"
        );
        ensure!(p.ensemble_runs > 0, "physics.ensemble_runs must be positive");

        let l = &self.lifecycle;
        let (start, end) = l.prediction_window_secs;
        ensure!(start <= end, "lifecycle.prediction_window_secs must be (start, end)");
        ensure!(l.settling_window > 0, "lifecycle.settling_window must be positive");

        let o = &self.outcome;
        ensure!(
            o.close_within <= o.acceptable_within,
            "outcome.close_within must not exceed acceptable_within"
        );
        ensure!(
            (0.0..=1.0).contains(&o.target_accuracy),
            "outcome.target_accuracy must lie in [0, 1]"
        );

        ensure!(self.session.channel_capacity > 0, "session.channel_capacity must be positive");
        Ok(())
    }
}
