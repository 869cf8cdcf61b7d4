//! Deterministic in-process harness: wires a `MotionPlanner` pull handler
//! through plan → split → stepper-command → ISR execution against the mock
//! hardware in [`crate::mock_hw`], and records a trace of what happened.
//!
//! Replaces the old tokio/Unix-socket `SimMcu`/`SimHost` pair entirely —
//! there is no wire protocol left to simulate once the core crates expose
//! plain Rust trait objects instead of an MCU/host split.

use std::collections::VecDeque;

use axis_stepper::AxisStepperEngine;
use motion_planner::{CommitRegion, MotionPlanner, PlannerConfig, PullHandler, PullResponse, RawAxisMove};

use crate::mock_hw::{MockStepper, MockTimer, NeverTrip, VecCommandSource};
use crate::SimError;

/// One recorded event, cheap enough to log on every ISR tick without
/// affecting the timing the engine under test sees (the harness runs the
/// ISR synchronously in the test thread, so recording never competes with
/// a real interrupt).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "trace-dump", derive(serde::Serialize))]
pub enum TraceEntry {
    PlanPass { axis_commands: usize, channel_commands: usize, finished: bool },
    Step { axis: usize, position: i64 },
    AxisAborted { axis: usize },
}

/// Feeds a fixed list of moves to the planner, then reports finished —
/// the harness equivalent of a G-code source with a known, short program.
pub struct FixedMoveSource<const AXES: usize> {
    moves: VecDeque<RawAxisMove<AXES>>,
}

impl<const AXES: usize> FixedMoveSource<AXES> {
    pub fn new(moves: impl IntoIterator<Item = RawAxisMove<AXES>>) -> Self {
        Self { moves: moves.into_iter().collect() }
    }
}

impl<const AXES: usize> PullHandler<AXES> for FixedMoveSource<AXES> {
    fn pull(&mut self) -> PullResponse<AXES> {
        match self.moves.pop_front() {
            Some(mv) => PullResponse::AxesCommand(mv),
            None => PullResponse::Finished,
        }
    }
}

/// Final state of one axis after [`run_to_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisOutcome {
    pub position: i64,
    pub aborted: bool,
    /// `countAbortedRemSteps` (§5 "Cancellation"): the active command's
    /// remainder plus everything still queued on the per-axis stepper ring,
    /// still sitting in the planner's segment ring, or unconsumed by the
    /// split stage. Zero for an axis that ran to completion without
    /// aborting.
    pub unexecuted_steps: u32,
}

/// Drives `planner` to completion (every move planned, stepped, and
/// executed), optionally tripping the given `(axis, step_count)`'s endstop
/// mid-move — mirrors `tests/integration/motion_integration_test.rs`'s
/// plan → generate → execute pipeline, but against this workspace's real
/// `MotionPlanner`/`AxisStepperEngine` rather than a single combined ISR.
pub fn run_to_completion<const BITS: u32, const AXES: usize, H: PullHandler<AXES>>(
    planner: &mut MotionPlanner<BITS, AXES, H>,
    abort_axis: Option<(usize, u32)>,
) -> Result<([AxisOutcome; AXES], Vec<TraceEntry>), SimError> {
    let mut engines: [AxisStepperEngine<BITS>; AXES] = core::array::from_fn(|_| AxisStepperEngine::new());
    let mut steppers: Vec<MockStepper> = (0..AXES).map(|_| MockStepper::default()).collect();
    let mut timers: Vec<MockTimer> = (0..AXES).map(|_| MockTimer::default()).collect();
    let mut queues: Vec<VecCommandSource<BITS>> = (0..AXES).map(|_| VecCommandSource::default()).collect();
    let mut started = [false; AXES];
    let mut trace = Vec::new();
    let mut trip_points: [Option<crate::mock_hw::TripAtStep>; AXES] = core::array::from_fn(|axis| match abort_axis {
        Some((trip_axis, trip_at)) if trip_axis == axis => Some(crate::mock_hw::TripAtStep::new(trip_at)),
        _ => None,
    });

    loop {
        let out = planner.plan()?;
        tracing::debug!(axis_commands = out.axis_commands.len(), finished = out.finished, "plan pass");
        trace.push(TraceEntry::PlanPass {
            axis_commands: out.axis_commands.len(),
            channel_commands: out.channel_commands.len(),
            finished: out.finished,
        });

        // Only commit-region commands are actually published to the
        // per-axis stepper ring; backup-region commands preview the
        // replannable tail and get regenerated (and discarded) next pass.
        for cmd in out.axis_commands.iter() {
            if cmd.region == CommitRegion::Commit {
                queues[cmd.axis].queue.push_back(cmd.command);
            }
        }

        for axis in 0..AXES {
            if !started[axis] {
                if let Some(cmd) = queues[axis].queue.pop_front() {
                    engines[axis].start(&mut steppers[axis], &mut timers[axis], cmd);
                    started[axis] = true;
                }
            }
        }

        drain_armed_timers(&mut engines, &mut steppers, &mut timers, &mut queues, &mut trip_points, &mut trace);

        if engines.iter().any(|e| e.aborted()) {
            // Mirrors the planner's own terminal ABORTED transition (§3.5
            // "STEPPING -> ABORTED on m_aborted latched by ISR prestep
            // callback"): an endstop hit on any axis cancels the whole move.
            planner.abort();
            break;
        }

        if out.finished && queues.iter().all(|q| q.queue.is_empty()) && timers.iter().all(|t| !t.armed) {
            break;
        }
    }

    let outcomes: [AxisOutcome; AXES] = core::array::from_fn(|axis| AxisOutcome {
        position: engines[axis].position(),
        aborted: engines[axis].aborted(),
        unexecuted_steps: engines[axis].aborted_remaining()
            + queues[axis].queue.iter().map(|cmd| cmd.x.get()).sum::<u32>()
            + planner.uncommitted_steps(axis),
    });
    Ok((outcomes, trace))
}

/// Runs every armed axis's ISR to exhaustion of its currently queued
/// commands — a stand-in for the real timer interrupts firing, with no
/// concept of relative timing between axes since the harness only checks
/// final position/abort state, not inter-axis synchronization.
fn drain_armed_timers<const BITS: u32, const AXES: usize>(
    engines: &mut [AxisStepperEngine<BITS>; AXES],
    steppers: &mut [MockStepper],
    timers: &mut [MockTimer],
    queues: &mut [VecCommandSource<BITS>],
    trip_points: &mut [Option<crate::mock_hw::TripAtStep>; AXES],
    trace: &mut Vec<TraceEntry>,
) {
    let mut never_trip = NeverTrip;

    for axis in 0..AXES {
        loop {
            if !timers[axis].armed {
                break;
            }
            match &mut trip_points[axis] {
                Some(trip) => engines[axis].on_timer_interrupt(&mut steppers[axis], &mut timers[axis], trip, &mut queues[axis]),
                None => engines[axis].on_timer_interrupt(&mut steppers[axis], &mut timers[axis], &mut never_trip, &mut queues[axis]),
            }
            if engines[axis].aborted() {
                trace.push(TraceEntry::AxisAborted { axis });
                break;
            }
            trace.push(TraceEntry::Step { axis, position: engines[axis].position() });
        }
    }
}

/// Convenience for building a single-channel `RawAxisMove` in tests.
pub fn raw_move<const AXES: usize>(dir: [bool; AXES], delta: [u32; AXES], rel_max_v_rec: f32) -> RawAxisMove<AXES> {
    RawAxisMove { dir, delta, rel_max_v_rec }
}

/// A minimal planner config for harness-driven tests — values loose enough
/// that short test moves reach cruise without tripping the
/// acceleration-distance branch, unless a test wants otherwise.
/// `commit_count` must leave the planner's required lookahead headroom
/// (`LOOKAHEAD - commit_count >= 6`, i.e. `commit_count <= 2` here).
pub fn default_test_config<const AXES: usize>(commit_count: usize) -> PlannerConfig<AXES> {
    use motion_planner::AxisConfig;
    PlannerConfig {
        axes: core::array::from_fn(|_| AxisConfig {
            max_speed_rec: 1.0 / 200.0,
            max_accel_rec: 1.0 / 3000.0,
            distance_factor: 1.0,
            cornering_speed_computation_factor: 0.05,
            sync_min_step_time: 0.0,
            async_min_step_time: 0.0,
        }),
        commit_count,
        ticks_per_second: 1_000_000.0,
    }
}

/// Dumps a recorded trace to a JSON file, for CI artifacts that want the
/// full pipeline history rather than just the pass/fail assertion.
#[cfg(feature = "trace-dump")]
pub fn dump_trace(trace: &[TraceEntry], path: &std::path::Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(trace).expect("TraceEntry serializes without error");
    std::fs::write(path, json)
}
