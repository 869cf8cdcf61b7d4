//! # Motion Planner
//!
//! A bounded look-ahead trapezoidal motion planner: a segment ring fed by
//! chunked axis moves, a forward/backward velocity pass across the ring,
//! and per-axis stepper command generation handed off to
//! `axis_stepper::AxisStepperEngine`.
//!
//! Non-goals: jerk-limited (S-curve) profiles — every move is a trapezoid
//! or, when too short to reach cruise speed, a triangle. No dynamic
//! allocation; every buffer is a fixed-capacity `heapless` container sized
//! at compile time by the `BITS`/`AXES` const generics callers choose.

#![cfg_attr(not(test), no_std)]

pub mod construct;
pub mod error;
pub mod linear;
pub mod planner;
pub mod split;
pub mod stepgen;
pub mod types;

pub use error::PlannerError;
pub use linear::SegmentVelocity;
pub use planner::{MotionPlanner, PlanOutput, PlannerState, LOOKAHEAD};
pub use split::SplitState;
pub use types::{
    AxisConfig, ChannelPayload, CommitRegion, LpSeg, PlannedAxisCommand, PlannedChannelCommand, PlannerConfig,
    PullHandler, PullResponse, RawAxisMove, Segment, SegmentKind,
};
