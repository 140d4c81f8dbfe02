// src/interface.rs
//
// Seams to the collaborators outside the tracking core: whoever reads the
// landed pocket off the wheel, whoever stores finished spins, and the
// pocket predictor itself (swappable so the lifecycle can be exercised with
// a scripted predictor).

use crate::analysis::{sector_pocket, Kinematics, OutcomeEvaluator};
use crate::pocket_ring::Pocket;
use crate::types::SpinRecord;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub trait PocketPredictor {
    fn predict(&self, kinematics: &Kinematics) -> Pocket;
}

impl<F> PocketPredictor for F
where
    F: Fn(&Kinematics) -> Pocket,
{
    fn predict(&self, kinematics: &Kinematics) -> Pocket {
        self(kinematics)
    }
}

/// What the lifecycle knows about the settled ball when a spin finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveRequest {
    pub frame_index: u64,
    /// Circular mean of the ball angles collected while settling.
    pub mean_ball_angle: f64,
    /// Last seen wheel marker angle, 0 if the marker was never seen.
    pub wheel_angle: f64,
}

/// Reads the pocket the ball landed in (OCR, marker lookup, operator input).
pub trait ActualResultResolver {
    /// None when the pocket could not be determined.
    fn resolve(&mut self, request: &ResolveRequest) -> Option<Pocket>;
}

impl<F> ActualResultResolver for F
where
    F: FnMut(&ResolveRequest) -> Option<Pocket>,
{
    fn resolve(&mut self, request: &ResolveRequest) -> Option<Pocket> {
        self(request)
    }
}

/// Resolver for setups without any result reader. Every actual is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ActualResultResolver for NoResolver {
    fn resolve(&mut self, _request: &ResolveRequest) -> Option<Pocket> {
        None
    }
}

/// Estimates the landed pocket from the settled ball angle relative to the
/// wheel marker, with no visual confirmation.
///
/// The estimate uses the same angle data the prediction was built from, so
/// accuracy figures computed against it are optimistic. Opt-in only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorResolver;

impl ActualResultResolver for SectorResolver {
    fn resolve(&mut self, request: &ResolveRequest) -> Option<Pocket> {
        let pocket = sector_pocket(request.mean_ball_angle - request.wheel_angle);
        warn!(
            "📐 Actual pocket {} estimated from angles only (frame {})",
            pocket, request.frame_index
        );
        Some(pocket)
    }
}

/// Replays pocket readings captured by an external reader, keyed by frame.
#[derive(Debug, Clone, Default)]
pub struct RecordedResolver {
    readings: BTreeMap<u64, Pocket>,
}

impl RecordedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame_index: u64, pocket: Pocket) {
        self.readings.insert(frame_index, pocket);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl FromIterator<(u64, Pocket)> for RecordedResolver {
    fn from_iter<I: IntoIterator<Item = (u64, Pocket)>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}

impl ActualResultResolver for RecordedResolver {
    /// Latest reading at or before the requested frame. Consumed readings are
    /// dropped so a stale value never leaks into the next spin.
    fn resolve(&mut self, request: &ResolveRequest) -> Option<Pocket> {
        let (&frame, &pocket) = self.readings.range(..=request.frame_index).next_back()?;
        self.readings = self.readings.split_off(&(frame + 1));
        Some(pocket)
    }
}

/// Receives every finished spin.
pub trait ResultSink {
    fn record(&mut self, record: &SpinRecord);
}

/// Keeps finished spins in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<SpinRecord>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, record: &SpinRecord) {
        self.records.push(record.clone());
    }
}

/// Logs one line per finished spin.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink {
    evaluator: OutcomeEvaluator,
}

impl LoggingSink {
    pub fn new(evaluator: OutcomeEvaluator) -> Self {
        Self { evaluator }
    }
}

impl ResultSink for LoggingSink {
    fn record(&mut self, record: &SpinRecord) {
        let fmt_pocket = |p: Option<Pocket>| p.map(|p| p.to_string()).unwrap_or_else(|| "?".into());
        match record.distance {
            Some(d) => info!(
                "🎲 [RESULT] {} Spin #{} predicted {} | actual {} | distance {} pockets",
                self.evaluator.classify(d).icon(),
                record.spin_index,
                fmt_pocket(record.predicted),
                fmt_pocket(record.actual.observed()),
                d
            ),
            None => info!(
                "🎲 [RESULT] Spin #{} predicted {} | actual {} | distance N/A",
                record.spin_index,
                fmt_pocket(record.predicted),
                fmt_pocket(record.actual.observed()),
            ),
        }
    }
}

/// Fan a record out to two sinks.
impl<A: ResultSink, B: ResultSink> ResultSink for (A, B) {
    fn record(&mut self, record: &SpinRecord) {
        self.0.record(record);
        self.1.record(record);
    }
}
