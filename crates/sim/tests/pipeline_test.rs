//! End-to-end wiring tests: a two-axis corner move through the full
//! plan → split → stepper-command → ISR pipeline, and a heater
//! set-and-wait running through `heater-control`'s real state machine —
//! both driven by the harness in `sim::harness`/`sim::heater_harness`
//! rather than each crate's own (already-covered) unit tests.

use fixed_time::Fixed1616;
use heater_control::{FixedPid, HeaterConfig, HeaterControlLoop, HeaterError, SafetyLimits};
use motion_planner::MotionPlanner;
use sim::{default_test_config, raw_move, run_to_completion, wait_for_target, FixedMoveSource};

#[test]
fn two_axis_corner_move_steps_each_axis_the_requested_count() {
    let config = default_test_config::<2>(2);
    let moves = FixedMoveSource::new([raw_move([true, false], [800, 0], 1.0 / 40.0), raw_move([false, true], [0, 800], 1.0 / 40.0)]);
    let mut planner: MotionPlanner<13, 2, _> = MotionPlanner::new(config, moves).unwrap();

    let (outcomes, _trace) = run_to_completion(&mut planner, None).unwrap();

    assert_eq!(outcomes[0].position, 800);
    assert_eq!(outcomes[1].position, 800);
    assert!(!outcomes[0].aborted);
    assert!(!outcomes[1].aborted);
}

#[test]
fn long_move_splits_into_multiple_segments_but_steps_the_full_distance() {
    // StepFixed<13> caps a single stepper command at 8191 steps; a 20000
    // step move must come out as several commands that still sum to
    // exactly 20000 executed steps.
    let config = default_test_config::<1>(2);
    let moves = FixedMoveSource::new([raw_move([true], [20000], 1.0 / 40.0)]);
    let mut planner: MotionPlanner<13, 1, _> = MotionPlanner::new(config, moves).unwrap();

    let (outcomes, trace) = run_to_completion(&mut planner, None).unwrap();

    assert_eq!(outcomes[0].position, 20000);
    let plan_passes = trace.iter().filter(|e| matches!(e, sim::TraceEntry::PlanPass { .. })).count();
    assert!(plan_passes >= 3, "expected the split buffer to need several plan passes, saw {plan_passes}");
}

#[test]
fn endstop_hit_mid_move_aborts_and_reports_unexecuted_steps() {
    // S4: a 100-step homing move whose endstop trips after 37 steps have
    // already been taken. The axis must latch `aborted` and report exactly
    // the 63 steps it never got to execute.
    let config = default_test_config::<1>(2);
    let moves = FixedMoveSource::new([raw_move([true], [100], 1.0 / 40.0)]);
    let mut planner: MotionPlanner<13, 1, _> = MotionPlanner::new(config, moves).unwrap();

    let (outcomes, trace) = run_to_completion(&mut planner, Some((0, 38))).unwrap();

    assert!(outcomes[0].aborted);
    assert_eq!(outcomes[0].position, 37);
    assert_eq!(outcomes[0].unexecuted_steps, 63);
    assert!(trace.iter().any(|e| matches!(e, sim::TraceEntry::AxisAborted { axis: 0 })));
}

#[test]
fn empty_move_list_finishes_immediately_with_no_steps() {
    let config = default_test_config::<1>(2);
    let moves = FixedMoveSource::new([]);
    let mut planner: MotionPlanner<13, 1, _> = MotionPlanner::new(config, moves).unwrap();

    let (outcomes, _trace) = run_to_completion(&mut planner, None).unwrap();

    assert_eq!(outcomes[0].position, 0);
}

fn heater_config() -> HeaterConfig {
    HeaterConfig {
        safety: SafetyLimits {
            min_safe_temp: Fixed1616::from_f32(-20.0),
            max_safe_temp: Fixed1616::from_f32(280.0),
            min_heat_gain_temp: Fixed1616::from_f32(2.0),
            min_heat_gain_ticks: u32::MAX, // isolate the wait-timeout path from the rate-of-rise latch
        },
        min_extrusion_temp: Fixed1616::from_f32(170.0),
        dt: Fixed1616::from_f32(1.0),
        in_range_hysteresis: Fixed1616::from_f32(2.0),
    }
}

#[test]
fn heater_reaches_target_while_motion_pipeline_finishes_in_parallel() {
    // Demonstrates the two cores running side by side with no shared state:
    // the motion pipeline and the heater loop are ticked independently by
    // the caller, the way a real firmware main loop would drive both.
    let config = default_test_config::<1>(2);
    let moves = FixedMoveSource::new([raw_move([true], [100], 1.0 / 40.0)]);
    let mut planner: MotionPlanner<13, 1, _> = MotionPlanner::new(config, moves).unwrap();
    let (outcomes, _trace) = run_to_completion(&mut planner, None).unwrap();
    assert_eq!(outcomes[0].position, 100);

    let mut heater_loop: HeaterControlLoop<1, 0, FixedPid> = HeaterControlLoop::new(
        [heater_config()],
        [FixedPid::new(Fixed1616::from_f32(5.0), Fixed1616::from_f32(0.1), Fixed1616::from_f32(1.0), Fixed1616::ONE)],
        300,
        30,
    )
    .unwrap();

    let mut temp = 25.0f32;
    let (result, _output) = wait_for_target(&mut heater_loop, 0, Fixed1616::from_f32(200.0), 300, |_| {
        temp += (200.0 - temp) * 0.1;
        Fixed1616::from_f32(temp)
    });

    assert_eq!(result, Ok(()));
}

#[test]
fn heater_wait_times_out_against_a_flat_temperature() {
    let mut heater_loop: HeaterControlLoop<1, 1, FixedPid> = HeaterControlLoop::new(
        [heater_config()],
        [FixedPid::new(Fixed1616::from_f32(5.0), Fixed1616::from_f32(0.1), Fixed1616::from_f32(1.0), Fixed1616::ONE)],
        300,
        30,
    )
    .unwrap();

    let (result, _output) = wait_for_target(&mut heater_loop, 0, Fixed1616::from_f32(200.0), 300, |_| Fixed1616::from_f32(20.0));

    assert_eq!(result, Err(HeaterError::WaitTimedOut));
}
