// src/pipeline/tracker.rs
//
// One tracker per camera/session. Single entry point: call process() once
// per frame, in order, from one owner. The tracker is deliberately not
// Sync-shared; see pipeline::session for confining it to a task.
//
// Per frame:
//   Observation → TrajectoryBuffer (speeds, path, confidence)
//               → FrameContext snapshot
//               → SpinLifecycle (activation, prediction gate, settling, result)
//               → FrameResult (+ events, metrics)

use super::event_bus::{EventBus, TrackerEvent};
use super::frame_context::FrameContext;
use super::metrics::TrackerMetrics;
use crate::analysis::{
    ArcConsistencyValidator, OutcomeEvaluator, PhysicsPredictor, SpinLifecycle, SpinState,
};
use crate::detection::{speed_to_rpm, Observation, PathPenalty, TrajectoryBuffer};
use crate::errors::TrackerError;
use crate::interface::{ActualResultResolver, PocketPredictor};
use crate::types::{Config, FrameResult};
use tracing::debug;

pub struct Tracker {
    buffer: TrajectoryBuffer,
    lifecycle: SpinLifecycle,
    events: EventBus,
    metrics: TrackerMetrics,
    frame_index: u64,
    clock: f64,
}

impl Tracker {
    pub fn new(config: &Config) -> Self {
        let predictor = PhysicsPredictor::new(config.physics.clone());
        Self::with_predictor(config, Box::new(predictor))
    }

    /// Tracker driven by a custom pocket predictor.
    pub fn with_predictor(config: &Config, predictor: Box<dyn PocketPredictor + Send>) -> Self {
        let lifecycle = SpinLifecycle::new(
            config.lifecycle.clone(),
            ArcConsistencyValidator::new(config.arc.clone()),
            predictor,
            config.physics.ensemble_runs,
            OutcomeEvaluator::new(config.outcome.clone()),
        );
        Self {
            buffer: TrajectoryBuffer::new(config.tracking.clone()),
            lifecycle,
            events: EventBus::new(config.session.max_pending_events),
            metrics: TrackerMetrics::new(),
            frame_index: 0,
            clock: 0.0,
        }
    }

    /// Process one observation. Fails only on malformed input, in which case
    /// no state is touched.
    pub fn process(
        &mut self,
        obs: &Observation,
        resolver: &mut dyn ActualResultResolver,
    ) -> Result<FrameResult, TrackerError> {
        obs.validate()?;

        let frame_index = self.frame_index;
        self.frame_index += 1;
        self.clock += obs.frame_dt;

        let update = self.buffer.update(obs);
        self.record_update_metrics(&update);
        if update.history_cleared {
            self.metrics.inc(&self.metrics.history_resets);
            self.events.publish(TrackerEvent::HistoryReset {
                frame_index,
                missed_frames: self.buffer.missed_frames(),
            });
        }

        let fps = obs.fps();
        let ball_rpm = speed_to_rpm(self.buffer.ball_speed(), fps);
        let wheel_rpm = speed_to_rpm(self.buffer.wheel_speed(), fps);

        let output = {
            let ctx = FrameContext::new(
                frame_index,
                self.clock,
                obs,
                &update,
                &self.buffer,
                ball_rpm,
                wheel_rpm,
            );
            self.lifecycle.update(&ctx, resolver)
        };

        for event in output.events {
            match &event {
                TrackerEvent::SpinStarted { .. } => self.metrics.inc(&self.metrics.spins_started),
                TrackerEvent::PredictionCommitted(_) => {
                    self.metrics.inc(&self.metrics.predictions_made)
                }
                TrackerEvent::SpinFinished(record) => {
                    self.metrics.inc(&self.metrics.spins_finished);
                    if record.actual.is_unknown() {
                        self.metrics.inc(&self.metrics.unknown_actuals);
                    }
                }
                _ => {}
            }
            self.events.publish(event);
        }

        if output.finished.is_some() {
            self.buffer.clear_history();
        }

        Ok(FrameResult {
            frame_index,
            confidence: self.buffer.confidence(),
            prediction: output.prediction,
            ball_speed_rpm: ball_rpm,
            wheel_speed_rpm: wheel_rpm,
            is_spinning: self.lifecycle.is_spinning(),
            ball_found: update.ball_found,
            wheel_found: update.wheel_found,
            spin_finished: output.finished,
        })
    }

    fn record_update_metrics(&self, update: &crate::detection::BufferUpdate) {
        let m = &self.metrics;
        m.inc(&m.total_frames);
        if update.ball_found {
            m.inc(&m.frames_with_ball);
        }
        if update.wheel_found {
            m.inc(&m.frames_with_wheel);
        }
        if update.penalty == Some(PathPenalty::Teleport) {
            m.inc(&m.rejected_samples);
        }
        if update.ball_found && update.path_confidence == 0.0 {
            debug!("Ambiguous detection: {:?}", update.penalty);
            m.inc(&m.zero_confidence_frames);
        }
    }

    /// Drop all tracking and lifecycle state, abandoning any spin in progress.
    pub fn reset(&mut self) {
        self.lifecycle.reset();
        self.buffer.reset();
        self.events.clear();
    }

    pub fn drain_events(&mut self) -> Vec<TrackerEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }

    pub fn state(&self) -> SpinState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &SpinLifecycle {
        &self.lifecycle
    }

    pub fn buffer(&self) -> &TrajectoryBuffer {
        &self.buffer
    }

    pub fn history_len(&self) -> usize {
        self.buffer.history_len()
    }

    pub fn confidence(&self) -> f64 {
        self.buffer.confidence()
    }

    /// Seconds of video processed so far.
    pub fn clock(&self) -> f64 {
        self.clock
    }
}
