// src/analysis/state_machine.rs
//
// SPIN LIFECYCLE
//
//   IDLE ──(ball or wheel moving)──▶ SPINNING ──(slow for long enough)──▶ IDLE
//                                       │
//                                       ├─ prediction gate (once per spin)
//                                       └─ settling sub-phase (timers only)
//
// A spin always runs to settlement once started; there is no cancel edge.
// Callers that need a timeout reset the tracker from outside.

use super::arc_validator::{ArcAssessment, ArcConsistencyValidator};
use super::outcome::OutcomeEvaluator;
use super::physics_predictor::{majority_vote, Kinematics};
use crate::detection::circular_mean;
use crate::interface::{ActualResultResolver, PocketPredictor, ResolveRequest};
use crate::pipeline::{FrameContext, TrackerEvent};
use crate::pocket_ring::Pocket;
use crate::types::{ActualOutcome, Prediction, SpinRecord};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

// ============================================================================
// ACTIVATION
// ============================================================================
const ACTIVATION_RPM: f64 = 2.0;
const ACTIVATION_SPEED: f64 = 0.02; // rad/frame

// ============================================================================
// PREDICTION GATE
// ============================================================================
const PREDICTION_WINDOW_SECS: (f64, f64) = (1.0, 3.0);
const MIN_CONFIDENCE: f64 = 50.0;
const MIN_HISTORY: usize = 15;
const WHEEL_SPEED_FALLBACK_RATIO: f64 = 0.35;

// ============================================================================
// SETTLING
// ============================================================================
const SETTLE_BALL_RPM: f64 = 8.0;
const SETTLE_WHEEL_RPM: f64 = 5.0;
const SETTLE_MIN_DURATION_SECS: f64 = 1.0;
const SETTLING_SECS: f64 = 1.5;
const MIN_SPIN_SECS: f64 = 2.0;
const SETTLING_WINDOW: usize = 10;

const DIAGNOSTICS_EVERY_FRAMES: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub activation_rpm: f64,
    pub activation_speed: f64,
    /// Spin age (seconds) during which a prediction may be committed.
    pub prediction_window_secs: (f64, f64),
    pub min_confidence: f64,
    pub min_history: usize,
    /// Wheel speed assumed as a fraction of ball speed when the marker is not visible.
    pub wheel_speed_fallback_ratio: f64,
    pub settle_ball_rpm: f64,
    pub settle_wheel_rpm: f64,
    pub settle_min_duration_secs: f64,
    /// How long the ball must stay settled before the result is read.
    pub settling_secs: f64,
    pub min_spin_secs: f64,
    pub settling_window: usize,
    pub diagnostics_every_frames: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            activation_rpm: ACTIVATION_RPM,
            activation_speed: ACTIVATION_SPEED,
            prediction_window_secs: PREDICTION_WINDOW_SECS,
            min_confidence: MIN_CONFIDENCE,
            min_history: MIN_HISTORY,
            wheel_speed_fallback_ratio: WHEEL_SPEED_FALLBACK_RATIO,
            settle_ball_rpm: SETTLE_BALL_RPM,
            settle_wheel_rpm: SETTLE_WHEEL_RPM,
            settle_min_duration_secs: SETTLE_MIN_DURATION_SECS,
            settling_secs: SETTLING_SECS,
            min_spin_secs: MIN_SPIN_SECS,
            settling_window: SETTLING_WINDOW,
            diagnostics_every_frames: DIAGNOSTICS_EVERY_FRAMES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpinState {
    Idle,
    Spinning,
}

/// First reason the prediction gate stayed closed on a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateBlock {
    AlreadyPredicted,
    OutsideWindow { duration: f64 },
    LowConfidence { confidence: f64 },
    ShortHistory { samples: usize },
    /// Breakdown is None when the history is shorter than the arc window.
    InconsistentArc(Option<ArcAssessment>),
    BallNotVisible,
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleOutput {
    /// Committed prediction of the current spin, if any.
    pub prediction: Option<Pocket>,
    pub finished: Option<SpinRecord>,
    pub events: Vec<TrackerEvent>,
}

struct Settling {
    started_at: f64,
    ball_angles: VecDeque<f64>,
}

pub struct SpinLifecycle {
    config: LifecycleConfig,
    arc: ArcConsistencyValidator,
    predictor: Box<dyn PocketPredictor + Send>,
    ensemble_runs: usize,
    evaluator: OutcomeEvaluator,

    state: SpinState,
    spin_index: u64,
    spin_started_at: f64,
    prediction: Option<Prediction>,
    settling: Option<Settling>,
    final_wheel_angle: Option<f64>,
}

impl SpinLifecycle {
    pub fn new(
        config: LifecycleConfig,
        arc: ArcConsistencyValidator,
        predictor: Box<dyn PocketPredictor + Send>,
        ensemble_runs: usize,
        evaluator: OutcomeEvaluator,
    ) -> Self {
        Self {
            config,
            arc,
            predictor,
            ensemble_runs: ensemble_runs.max(1),
            evaluator,
            state: SpinState::Idle,
            spin_index: 0,
            spin_started_at: 0.0,
            prediction: None,
            settling: None,
            final_wheel_angle: None,
        }
    }

    pub fn update(
        &mut self,
        ctx: &FrameContext,
        resolver: &mut dyn ActualResultResolver,
    ) -> LifecycleOutput {
        let mut out = LifecycleOutput::default();

        match self.state {
            SpinState::Idle => {
                if self.should_activate(ctx) {
                    self.start_spin(ctx.now);
                    out.events.push(TrackerEvent::SpinStarted {
                        spin_index: self.spin_index,
                        at: ctx.now,
                    });
                }
            }
            SpinState::Spinning => {
                let duration = ctx.now - self.spin_started_at;

                match self.prediction_gate(ctx, duration) {
                    Ok(kinematics) => {
                        if let Some(pocket) =
                            majority_vote(&*self.predictor, &kinematics, self.ensemble_runs)
                        {
                            let prediction = Prediction {
                                pocket,
                                spin_started_at: self.spin_started_at,
                                committed_at: ctx.now,
                                confidence: ctx.confidence,
                                ball_rpm: ctx.ball_rpm,
                            };
                            info!(
                                "🎯 [PREDICTION] {} (confidence: {:.0}%, ball RPM: {:.0})",
                                pocket, ctx.confidence, ctx.ball_rpm
                            );
                            self.prediction = Some(prediction);
                            out.events.push(TrackerEvent::PredictionCommitted(prediction));
                        }
                    }
                    Err(block) => {
                        if self.should_log_block(ctx.frame_index, duration) {
                            debug!(
                                "Prediction blocked: {:?} (t={:.1}s, conf={:.0}%, history={})",
                                block,
                                duration,
                                ctx.confidence,
                                ctx.history_len()
                            );
                        }
                    }
                }

                out.prediction = self.prediction.map(|p| p.pocket);

                // Settling and completion only advance on frames that are still slow.
                if self.is_settle_frame(ctx, duration) {
                    if let Some(event) = self.track_settling(ctx) {
                        out.events.push(event);
                    }

                    if let Some(record) = self.try_finish(ctx, duration, resolver) {
                        out.events.push(TrackerEvent::SpinFinished(record.clone()));
                        out.finished = Some(record);
                    }
                }
            }
        }

        out
    }

    fn should_activate(&self, ctx: &FrameContext) -> bool {
        let c = &self.config;
        (ctx.ball_rpm > c.activation_rpm || ctx.wheel_rpm > c.activation_rpm)
            && (ctx.ball_found || ctx.wheel_found)
            && (ctx.ball_speed > c.activation_speed || ctx.wheel_speed > c.activation_speed)
    }

    fn start_spin(&mut self, now: f64) {
        self.state = SpinState::Spinning;
        self.spin_index += 1;
        self.spin_started_at = now;
        self.prediction = None;
        self.settling = None;
        self.final_wheel_angle = None;
        info!("🎰 [SPIN STARTED] #{}", self.spin_index);
    }

    /// Gate for the once-per-spin prediction. On success returns the input
    /// snapshot for the predictor.
    fn prediction_gate(&self, ctx: &FrameContext, duration: f64) -> Result<Kinematics, GateBlock> {
        let c = &self.config;
        if self.prediction.is_some() {
            return Err(GateBlock::AlreadyPredicted);
        }
        let (start, end) = c.prediction_window_secs;
        if duration < start || duration > end {
            return Err(GateBlock::OutsideWindow { duration });
        }
        if ctx.confidence <= c.min_confidence {
            return Err(GateBlock::LowConfidence {
                confidence: ctx.confidence,
            });
        }
        if ctx.history_len() < c.min_history {
            return Err(GateBlock::ShortHistory {
                samples: ctx.history_len(),
            });
        }
        let recent = ctx.recent_points(self.arc.window());
        match self.arc.assess(&recent, ctx.center, ctx.track_radius) {
            Some(assessment) if assessment.is_consistent() => {}
            assessment => return Err(GateBlock::InconsistentArc(assessment)),
        }
        let ball_angle = ctx.ball_angle.ok_or(GateBlock::BallNotVisible)?;

        // Without a marker this frame, assume the wheel sits under the ball
        // and turns at a fixed fraction of the ball speed.
        let (wheel_angle, wheel_speed) = match ctx.wheel_angle {
            Some(angle) => (angle, ctx.wheel_speed),
            None => (ball_angle, ctx.ball_speed * c.wheel_speed_fallback_ratio),
        };

        Ok(Kinematics {
            wheel_speed,
            ball_speed: ctx.ball_speed,
            wheel_angle,
            ball_angle,
        })
    }

    /// Blocking reasons are logged while no prediction exists, on every
    /// `diagnostics_every_frames`-th frame of an even second of the spin.
    fn should_log_block(&self, frame_index: u64, duration: f64) -> bool {
        let every = self.config.diagnostics_every_frames;
        self.prediction.is_none()
            && every > 0
            && frame_index % every == 0
            && (duration.max(0.0) as u64) % 2 == 0
    }

    fn is_settle_frame(&self, ctx: &FrameContext, duration: f64) -> bool {
        let c = &self.config;
        ctx.ball_rpm < c.settle_ball_rpm
            && ctx.wheel_rpm < c.settle_wheel_rpm
            && duration >= c.settle_min_duration_secs
    }

    fn track_settling(&mut self, ctx: &FrameContext) -> Option<TrackerEvent> {
        let c = &self.config;
        let mut event = None;
        if self.settling.is_none() {
            debug!(
                "Ball settling... RPM: ball={:.0}, wheel={:.0}",
                ctx.ball_rpm, ctx.wheel_rpm
            );
            self.settling = Some(Settling {
                started_at: ctx.now,
                ball_angles: VecDeque::with_capacity(c.settling_window),
            });
            event = Some(TrackerEvent::SettlingStarted {
                spin_index: self.spin_index,
                at: ctx.now,
            });
        }

        if let Some(settling) = self.settling.as_mut() {
            if let Some(angle) = ctx.ball_angle {
                settling.ball_angles.push_back(angle);
                if settling.ball_angles.len() > c.settling_window {
                    settling.ball_angles.pop_front();
                }
            }
        }
        if let Some(angle) = ctx.wheel_angle {
            self.final_wheel_angle = Some(angle);
        }
        event
    }

    fn try_finish(
        &mut self,
        ctx: &FrameContext,
        duration: f64,
        resolver: &mut dyn ActualResultResolver,
    ) -> Option<SpinRecord> {
        let settling = self.settling.as_ref()?;
        if !(ctx.now - settling.started_at > self.config.settling_secs
            && duration >= self.config.min_spin_secs)
        {
            return None;
        }

        let samples = settling.ball_angles.len();
        debug!("Detecting final number... (settling samples: {})", samples);
        let actual: ActualOutcome = match circular_mean(settling.ball_angles.iter().copied()) {
            Some(mean_ball_angle) => resolver
                .resolve(&ResolveRequest {
                    frame_index: ctx.frame_index,
                    mean_ball_angle,
                    wheel_angle: self.final_wheel_angle.unwrap_or(0.0),
                })
                .into(),
            None => ActualOutcome::Unknown,
        };
        if actual.is_unknown() {
            warn!("❔ Spin #{} finished without a readable pocket", self.spin_index);
        }

        let record = SpinRecord::new(
            self.spin_index,
            self.prediction.map(|p| p.pocket),
            actual,
            &self.evaluator,
            self.spin_started_at,
            duration,
            samples,
        );
        self.reset_to_idle();
        Some(record)
    }

    fn reset_to_idle(&mut self) {
        self.state = SpinState::Idle;
        self.prediction = None;
        self.settling = None;
        self.final_wheel_angle = None;
    }

    /// Abandon any spin in progress.
    pub fn reset(&mut self) {
        if self.state == SpinState::Spinning {
            info!("⏹ Spin #{} abandoned", self.spin_index);
        }
        self.reset_to_idle();
    }

    pub fn state(&self) -> SpinState {
        self.state
    }

    pub fn is_spinning(&self) -> bool {
        self.state == SpinState::Spinning
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn is_settling(&self) -> bool {
        self.settling.is_some()
    }

    pub fn spin_index(&self) -> u64 {
        self.spin_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::OutcomeClass;
    use crate::detection::Point;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn center() -> Point {
        Point::new(250.0, 250.0)
    }

    /// Clean decelerating orbit long enough to pass the history gate.
    fn clean_history() -> VecDeque<Point> {
        let mut angle = 0.0;
        let mut step = 0.12;
        (0..20)
            .map(|_| {
                let p = Point::on_circle(center(), 200.0, angle);
                angle += step;
                step *= 0.9;
                p
            })
            .collect()
    }

    /// A fast, well-tracked frame.
    fn moving(history: &VecDeque<Point>, frame_index: u64, now: f64) -> FrameContext<'_> {
        FrameContext {
            frame_index,
            now,
            ball_found: true,
            wheel_found: true,
            ball_angle: Some(1.0),
            wheel_angle: Some(0.5),
            ball_speed: 0.05,
            wheel_speed: 0.02,
            ball_rpm: 30.0,
            wheel_rpm: 10.0,
            confidence: 80.0,
            history,
            center: center(),
            track_radius: 240.0,
        }
    }

    /// A frame with the ball nearly at rest at `ball_angle`.
    fn settled(
        history: &VecDeque<Point>,
        frame_index: u64,
        now: f64,
        ball_angle: Option<f64>,
    ) -> FrameContext<'_> {
        FrameContext {
            ball_found: ball_angle.is_some(),
            ball_angle,
            wheel_angle: Some(0.4),
            ball_speed: 0.005,
            wheel_speed: 0.002,
            ball_rpm: 3.0,
            wheel_rpm: 1.0,
            ..moving(history, frame_index, now)
        }
    }

    fn pocket(label: u8) -> Pocket {
        Pocket::new(label).unwrap()
    }

    fn lifecycle_with(predictor: Box<dyn PocketPredictor + Send>) -> SpinLifecycle {
        SpinLifecycle::new(
            LifecycleConfig::default(),
            ArcConsistencyValidator::default(),
            predictor,
            5,
            OutcomeEvaluator::default(),
        )
    }

    fn counting_lifecycle(calls: Arc<AtomicUsize>) -> SpinLifecycle {
        lifecycle_with(Box::new(move |_: &Kinematics| {
            calls.fetch_add(1, Ordering::SeqCst);
            pocket(17)
        }))
    }

    fn no_result(_: &ResolveRequest) -> Option<Pocket> {
        None
    }

    #[test]
    fn test_activates_on_moving_ball() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        assert_eq!(lc.state(), SpinState::Idle);

        let out = lc.update(&moving(&history, 0, 0.0), &mut no_result);
        assert_eq!(lc.state(), SpinState::Spinning);
        assert_eq!(lc.spin_index(), 1);
        assert!(matches!(
            out.events.as_slice(),
            [TrackerEvent::SpinStarted { spin_index: 1, .. }]
        ));
        assert_eq!(out.prediction, None, "no prediction on the activation frame");
    }

    #[test]
    fn test_stays_idle_without_detection_or_speed() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));

        let blind = FrameContext {
            ball_found: false,
            wheel_found: false,
            ..moving(&history, 0, 0.0)
        };
        lc.update(&blind, &mut no_result);
        assert_eq!(lc.state(), SpinState::Idle, "nothing detected");

        let slow = FrameContext {
            ball_speed: 0.01,
            wheel_speed: 0.01,
            ..moving(&history, 1, 0.1)
        };
        lc.update(&slow, &mut no_result);
        assert_eq!(lc.state(), SpinState::Idle, "rad/frame below threshold");

        let low_rpm = FrameContext {
            ball_rpm: 1.0,
            wheel_rpm: 1.0,
            ..moving(&history, 2, 0.2)
        };
        lc.update(&low_rpm, &mut no_result);
        assert_eq!(lc.state(), SpinState::Idle, "rpm below threshold");
    }

    #[test]
    fn test_prediction_committed_once_per_spin() {
        let history = clean_history();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut lc = counting_lifecycle(calls.clone());

        lc.update(&moving(&history, 0, 0.0), &mut no_result);
        let out = lc.update(&moving(&history, 90, 1.5), &mut no_result);
        assert_eq!(out.prediction, Some(pocket(17)));
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TrackerEvent::PredictionCommitted(p) if p.pocket == pocket(17))));
        assert_eq!(calls.load(Ordering::SeqCst), 5, "one call per ensemble run");

        let committed = *lc.prediction().unwrap();
        assert_eq!(committed.committed_at, 1.5);
        assert_eq!(committed.spin_started_at, 0.0);

        for (i, now) in [1.6, 2.0, 2.9].iter().enumerate() {
            let out = lc.update(&moving(&history, 91 + i as u64, *now), &mut no_result);
            assert_eq!(out.prediction, Some(pocket(17)));
            assert!(out.events.is_empty(), "prediction re-committed at {}", now);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_prediction_gate_blocks() {
        let history = clean_history();
        let short: VecDeque<Point> = history.iter().take(10).copied().collect();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut lc = counting_lifecycle(calls.clone());
        lc.update(&moving(&history, 0, 0.0), &mut no_result);

        let blocked = [
            moving(&history, 1, 0.5),
            moving(&history, 2, 3.5),
            FrameContext {
                confidence: 50.0,
                ..moving(&history, 3, 1.5)
            },
            moving(&short, 4, 1.5),
            FrameContext {
                ball_angle: None,
                ball_found: false,
                ..moving(&history, 5, 1.5)
            },
        ];
        for ctx in blocked.iter() {
            let out = lc.update(ctx, &mut no_result);
            assert_eq!(out.prediction, None, "predicted on frame {}", ctx.frame_index);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(lc.is_spinning());
    }

    #[test]
    fn test_wheel_fallback_when_marker_missing() {
        let history = clean_history();
        let seen: Arc<Mutex<Option<Kinematics>>> = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let mut lc = lifecycle_with(Box::new(move |k: &Kinematics| {
            *sink.lock().unwrap() = Some(*k);
            pocket(5)
        }));

        lc.update(&moving(&history, 0, 0.0), &mut no_result);
        let ctx = FrameContext {
            wheel_found: false,
            wheel_angle: None,
            ..moving(&history, 1, 1.2)
        };
        let out = lc.update(&ctx, &mut no_result);
        assert_eq!(out.prediction, Some(pocket(5)));

        let k = seen.lock().unwrap().unwrap();
        assert_eq!(k.wheel_angle, 1.0, "wheel assumed under the ball");
        assert!((k.wheel_speed - 0.05 * 0.35).abs() < 1e-12);
        assert_eq!(k.ball_speed, 0.05);
    }

    #[test]
    fn test_spin_finishes_after_settling() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        let requests: Arc<Mutex<Vec<ResolveRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        let mut resolver = move |r: &ResolveRequest| {
            log.lock().unwrap().push(*r);
            Pocket::new(20).ok()
        };

        lc.update(&moving(&history, 0, 0.0), &mut resolver);
        lc.update(&moving(&history, 1, 1.5), &mut resolver);
        assert_eq!(lc.prediction().map(|p| p.pocket), Some(pocket(17)));

        let out = lc.update(&settled(&history, 2, 1.6, Some(0.2)), &mut resolver);
        assert!(lc.is_settling());
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TrackerEvent::SettlingStarted { spin_index: 1, .. })));

        for (i, now) in [2.0, 2.5, 3.0].iter().enumerate() {
            let out = lc.update(&settled(&history, 3 + i as u64, *now, Some(0.2)), &mut resolver);
            assert!(out.finished.is_none(), "finished early at {}", now);
        }
        assert!(requests.lock().unwrap().is_empty());

        let out = lc.update(&settled(&history, 6, 3.2, Some(0.2)), &mut resolver);
        let record = out.finished.expect("spin should finish");
        assert_eq!(record.spin_index, 1);
        assert_eq!(record.predicted, Some(pocket(17)));
        assert_eq!(record.actual, ActualOutcome::Observed(pocket(20)));
        assert_eq!(record.display, Some(pocket(20)));
        assert_eq!(record.distance, Some(2));
        assert_eq!(record.class, Some(OutcomeClass::Close));
        assert_eq!(record.settling_samples, 5);
        assert!((record.duration_secs - 3.2).abs() < 1e-9);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TrackerEvent::SpinFinished(r) if r.spin_index == 1)));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!((requests[0].mean_ball_angle - 0.2).abs() < 1e-9);
        assert_eq!(requests[0].wheel_angle, 0.4);

        assert_eq!(lc.state(), SpinState::Idle);
        assert!(lc.prediction().is_none());
        assert!(!lc.is_settling());
    }

    #[test]
    fn test_settling_mean_handles_wraparound() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        let mean = Arc::new(Mutex::new(None));
        let out_mean = mean.clone();
        let mut resolver = move |r: &ResolveRequest| -> Option<Pocket> {
            *out_mean.lock().unwrap() = Some(r.mean_ball_angle);
            None
        };

        lc.update(&moving(&history, 0, 0.0), &mut resolver);
        let angles = [6.2, 0.05, 6.25, 0.1];
        let mut finished = None;
        for (i, now) in [1.0, 1.5, 2.0, 2.6].iter().enumerate() {
            let ctx = settled(&history, 1 + i as u64, *now, Some(angles[i]));
            finished = lc.update(&ctx, &mut resolver).finished;
        }
        assert!(finished.is_some());

        let mean = mean.lock().unwrap().unwrap();
        let off_zero = mean.sin().atan2(mean.cos()).abs();
        assert!(off_zero < 0.1, "mean {} should sit next to zero", mean);
    }

    #[test]
    fn test_unknown_actual_without_settling_samples() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut resolver = move |_: &ResolveRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            Pocket::new(3).ok()
        };

        lc.update(&moving(&history, 0, 0.0), &mut resolver);
        let mut finished = None;
        for (i, now) in [1.0, 1.8, 2.6].iter().enumerate() {
            finished = lc
                .update(&settled(&history, 1 + i as u64, *now, None), &mut resolver)
                .finished;
        }
        let record = finished.expect("spin should finish");
        assert_eq!(record.actual, ActualOutcome::Unknown);
        assert_eq!(record.predicted, None);
        assert_eq!(record.display, None);
        assert_eq!(record.distance, None);
        assert_eq!(record.settling_samples, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "resolver skipped without angles");
    }

    #[test]
    fn test_fast_frame_after_settling_dip_does_not_finish() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut resolver = move |_: &ResolveRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            Pocket::new(3).ok()
        };

        lc.update(&moving(&history, 0, 0.0), &mut resolver);
        lc.update(&settled(&history, 1, 1.0, Some(0.2)), &mut resolver);
        assert!(lc.is_settling(), "low-rpm dip starts the settling timer");

        // ball picked up speed again after the dip
        let out = lc.update(&moving(&history, 2, 2.6), &mut resolver);
        assert!(out.finished.is_none(), "spin finished on a 30 rpm frame");
        assert!(lc.is_spinning());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // a slow frame afterwards completes it against the original timer
        let out = lc.update(&settled(&history, 3, 2.7, Some(0.2)), &mut resolver);
        let record = out.finished.expect("spin should finish once slow again");
        assert_eq!(record.settling_samples, 2);
        assert_eq!(lc.state(), SpinState::Idle);
    }

    #[test]
    fn test_block_diagnostics_cadence() {
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        assert!(lc.should_log_block(120, 0.4));
        assert!(lc.should_log_block(180, 2.5));
        assert!(!lc.should_log_block(121, 0.4), "off-cadence frame");
        assert!(!lc.should_log_block(120, 1.5), "odd second of the spin");
        assert!(!lc.should_log_block(60, 3.9));

        lc.config.diagnostics_every_frames = 0;
        assert!(!lc.should_log_block(120, 0.4), "diagnostics disabled");
    }

    #[test]
    fn test_reset_abandons_spin() {
        let history = clean_history();
        let mut lc = counting_lifecycle(Arc::new(AtomicUsize::new(0)));
        lc.update(&moving(&history, 0, 0.0), &mut no_result);
        lc.update(&moving(&history, 1, 1.5), &mut no_result);
        assert!(lc.prediction().is_some());

        lc.reset();
        assert_eq!(lc.state(), SpinState::Idle);
        assert!(lc.prediction().is_none());

        lc.update(&moving(&history, 2, 4.0), &mut no_result);
        assert_eq!(lc.spin_index(), 2, "next spin gets a fresh index");
    }
}
