// src/pipeline/event_bus.rs
//
// Lifecycle and tracking events, queued for whoever composes the pipeline
// (session task, UI bridge). Publishers never block; the oldest event is
// dropped when nobody drains the queue.

use crate::types::{Prediction, SpinRecord};
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    SpinStarted {
        spin_index: u64,
        at: f64,
    },

    PredictionCommitted(Prediction),

    SettlingStarted {
        spin_index: u64,
        at: f64,
    },

    SpinFinished(SpinRecord),

    /// Ball lost long enough that the trajectory history was wiped.
    HistoryReset {
        frame_index: u64,
        missed_frames: u32,
    },
}

pub struct EventBus {
    events: VecDeque<TrackerEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
        }
    }

    pub fn publish(&mut self, event: TrackerEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<TrackerEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
