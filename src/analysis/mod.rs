// src/analysis/mod.rs
//
// Spin analysis modules.
//
// Signal flow:
//   FrameContext → state_machine (activation, gating, settling)
//                    ├→ arc_validator      (is the recent path a clean decaying orbit?)
//                    ├→ physics_predictor  (where will the ball drop?)
//                    └→ outcome            (how far off was the prediction?)
//
// Orchestrated by pipeline::Tracker.

pub mod arc_validator;
pub mod outcome;
pub mod physics_predictor;
pub mod state_machine;

pub use arc_validator::{ArcAssessment, ArcConfig, ArcConsistencyValidator};
pub use outcome::{AccuracyReport, OutcomeClass, OutcomeConfig, OutcomeEvaluator};
pub use physics_predictor::{
    majority_vote, sector_pocket, Kinematics, PhysicsConfig, PhysicsPredictor, SimulationOutcome,
};
pub use state_machine::{GateBlock, LifecycleConfig, LifecycleOutput, SpinLifecycle, SpinState};
