// src/pipeline/session.rs
//
// Confines one tracker to one tokio task. Observations are processed
// strictly in arrival order, so concurrent producers never interleave
// mutations of the same tracker. One session per camera; sessions share
// nothing.

use super::event_bus::TrackerEvent;
use super::metrics::TrackerMetrics;
use super::tracker::Tracker;
use crate::detection::Observation;
use crate::errors::{SessionError, TrackerError};
use crate::interface::{ActualResultResolver, ResultSink};
use crate::types::FrameResult;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 256;
const MAX_PENDING_EVENTS: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Observations that may queue up before producers wait.
    pub channel_capacity: usize,
    /// Tracker events kept between drains.
    pub max_pending_events: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: CHANNEL_CAPACITY,
            max_pending_events: MAX_PENDING_EVENTS,
        }
    }
}

enum SessionCommand {
    Observe {
        observation: Observation,
        reply: oneshot::Sender<Result<FrameResult, TrackerError>>,
    },
    Reset,
}

pub struct TrackerSession<S> {
    sender: mpsc::Sender<SessionCommand>,
    task: JoinHandle<S>,
    metrics: TrackerMetrics,
}

impl<S> TrackerSession<S>
where
    S: ResultSink + Send + 'static,
{
    /// Spawn the session task. Must be called from within a tokio runtime.
    pub fn spawn<R>(tracker: Tracker, resolver: R, sink: S, config: &SessionConfig) -> Self
    where
        R: ActualResultResolver + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let metrics = tracker.metrics().clone();
        let task = tokio::spawn(run(tracker, resolver, sink, receiver));
        Self {
            sender,
            task,
            metrics,
        }
    }

    pub async fn observe(&self, observation: Observation) -> Result<FrameResult, SessionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SessionCommand::Observe { observation, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        let result = response.await.map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    /// Abandon the current spin and clear all tracking state.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Reset)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Shared view of the tracker's counters.
    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }

    /// Stop accepting observations, let queued ones finish and hand back the sink.
    pub async fn shutdown(self) -> Result<S, SessionError> {
        drop(self.sender);
        self.task.await.map_err(|_| SessionError::Closed)
    }
}

async fn run<R, S>(
    mut tracker: Tracker,
    mut resolver: R,
    mut sink: S,
    mut receiver: mpsc::Receiver<SessionCommand>,
) -> S
where
    R: ActualResultResolver,
    S: ResultSink,
{
    while let Some(command) = receiver.recv().await {
        match command {
            SessionCommand::Observe { observation, reply } => {
                let result = tracker.process(&observation, &mut resolver);
                for event in tracker.drain_events() {
                    match event {
                        TrackerEvent::SpinFinished(record) => sink.record(&record),
                        other => debug!("{:?}", other),
                    }
                }
                // Caller may have gone away; the frame is processed regardless.
                let _ = reply.send(result);
            }
            SessionCommand::Reset => {
                info!("🔄 Session reset");
                tracker.reset();
            }
        }
    }
    sink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;
    use crate::interface::{MemorySink, NoResolver};
    use crate::types::Config;

    fn frame() -> Observation {
        Observation::empty(1.0 / 60.0, Point::new(250.0, 250.0), 240.0)
    }

    #[tokio::test]
    async fn test_session_processes_in_order() {
        let config = Config::default();
        let session = TrackerSession::spawn(
            Tracker::new(&config),
            NoResolver,
            MemorySink::default(),
            &config.session,
        );

        for i in 0..5u64 {
            let result = session
                .observe(frame().with_ball(i as f64 * 0.05, 200.0))
                .await
                .unwrap();
            assert_eq!(result.frame_index, i);
        }
        assert_eq!(session.metrics().summary().total_frames, 5);

        let sink = session.shutdown().await.unwrap();
        assert!(sink.records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_observation_is_reported() {
        let config = Config::default();
        let session = TrackerSession::spawn(
            Tracker::new(&config),
            NoResolver,
            MemorySink::default(),
            &config.session,
        );

        let err = session
            .observe(frame().with_ball(f64::INFINITY, 200.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Tracker(_)));

        // session keeps running after a rejected frame
        let ok = session.observe(frame()).await.unwrap();
        assert_eq!(ok.frame_index, 0);
        session.reset().await.unwrap();
        session.shutdown().await.unwrap();
    }
}
