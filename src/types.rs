use crate::analysis::{
    ArcConfig, LifecycleConfig, OutcomeClass, OutcomeConfig, OutcomeEvaluator, PhysicsConfig,
};
use crate::detection::TrackingConfig;
use crate::pipeline::SessionConfig;
use crate::pocket_ring::Pocket;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub arc: ArcConfig,
    pub physics: PhysicsConfig,
    pub lifecycle: LifecycleConfig,
    pub outcome: OutcomeConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The single committed prediction of a spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub pocket: Pocket,
    pub spin_started_at: f64,
    pub committed_at: f64,
    /// Tracker confidence (0..=100) when the prediction was committed.
    pub confidence: f64,
    pub ball_rpm: f64,
}

/// Pocket the ball actually landed in, as far as the resolver could tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pocket", rename_all = "snake_case")]
pub enum ActualOutcome {
    Observed(Pocket),
    Unknown,
}

impl ActualOutcome {
    pub fn observed(&self) -> Option<Pocket> {
        match self {
            ActualOutcome::Observed(p) => Some(*p),
            ActualOutcome::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ActualOutcome::Unknown)
    }
}

impl From<Option<Pocket>> for ActualOutcome {
    fn from(p: Option<Pocket>) -> Self {
        p.map(ActualOutcome::Observed).unwrap_or(ActualOutcome::Unknown)
    }
}

/// One finished spin, handed to the results sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinRecord {
    pub spin_index: u64,
    pub predicted: Option<Pocket>,
    pub actual: ActualOutcome,
    /// Actual pocket, or the prediction when the actual is unknown. Display only.
    pub display: Option<Pocket>,
    /// Circular distance; None whenever either pocket is unknown.
    pub distance: Option<u8>,
    pub class: Option<OutcomeClass>,
    pub started_at: f64,
    pub duration_secs: f64,
    pub settling_samples: usize,
}

impl SpinRecord {
    pub fn new(
        spin_index: u64,
        predicted: Option<Pocket>,
        actual: ActualOutcome,
        evaluator: &OutcomeEvaluator,
        started_at: f64,
        duration_secs: f64,
        settling_samples: usize,
    ) -> Self {
        let distance = evaluator.distance(predicted, &actual);
        Self {
            spin_index,
            predicted,
            actual,
            display: actual.observed().or(predicted),
            distance,
            class: distance.map(|d| evaluator.classify(d)),
            started_at,
            duration_secs,
            settling_samples,
        }
    }
}

/// Per-frame output of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub frame_index: u64,
    /// Rolling confidence, 0..=100.
    pub confidence: f64,
    pub prediction: Option<Pocket>,
    pub ball_speed_rpm: f64,
    pub wheel_speed_rpm: f64,
    pub is_spinning: bool,
    pub ball_found: bool,
    pub wheel_found: bool,
    pub spin_finished: Option<SpinRecord>,
}
