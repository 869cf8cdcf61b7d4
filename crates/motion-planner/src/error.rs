//! Structural/setup errors for the motion planning crate.
//!
//! These are the only `Result`-returning surface in the crate — everything
//! on the hot planning/stepping path reports through latched flags and
//! handler callbacks instead (see `planner::MotionPlanner`'s state machine).

/// Errors raised at planner construction or while queuing external work.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlannerError {
    /// `commit_count` violates the minimum headroom the linear planner needs
    /// (`StepperSegmentBufferSize - LookaheadCommitCount >= 6`).
    InvalidCommitCount,
    /// The segment ring is full; the caller must wait for a plan pass to
    /// free a slot before calling `axes_command_done`/`channel_command_done`.
    QueueFull,
}
