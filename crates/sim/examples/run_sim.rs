//! Runs a small two-axis corner move and a heater warm-up side by side,
//! printing the trace — a smoke check runnable without any hardware.

use fixed_time::Fixed1616;
use heater_control::{FixedPid, HeaterConfig, HeaterControlLoop, SafetyLimits};
use motion_planner::MotionPlanner;
use sim::{default_test_config, raw_move, run_to_completion, wait_for_target, FixedMoveSource};

fn main() {
    tracing_subscriber::fmt::init();

    let config = default_test_config::<2>(2);
    let moves = FixedMoveSource::new([raw_move([true, false], [800, 0], 1.0 / 40.0), raw_move([false, true], [0, 800], 1.0 / 40.0)]);
    let mut planner: MotionPlanner<13, 2, _> = MotionPlanner::new(config, moves).expect("valid planner config");

    let (outcomes, trace) = run_to_completion(&mut planner, None).expect("pipeline runs to completion");
    println!("motion outcomes: {outcomes:?}");
    println!("plan passes: {}", trace.iter().filter(|e| matches!(e, sim::TraceEntry::PlanPass { .. })).count());

    let heater_config = HeaterConfig {
        safety: SafetyLimits {
            min_safe_temp: Fixed1616::from_f32(-20.0),
            max_safe_temp: Fixed1616::from_f32(280.0),
            min_heat_gain_temp: Fixed1616::from_f32(2.0),
            min_heat_gain_ticks: 20,
        },
        min_extrusion_temp: Fixed1616::from_f32(170.0),
        dt: Fixed1616::from_f32(1.0),
        in_range_hysteresis: Fixed1616::from_f32(2.0),
    };
    let mut heater_loop: HeaterControlLoop<1, 0, FixedPid> = HeaterControlLoop::new(
        [heater_config],
        [FixedPid::new(Fixed1616::from_f32(5.0), Fixed1616::from_f32(0.1), Fixed1616::from_f32(1.0), Fixed1616::ONE)],
        300,
        30,
    )
    .expect("valid heater config");

    let mut temp = 25.0f32;
    let (result, output) = wait_for_target(&mut heater_loop, 0, Fixed1616::from_f32(200.0), 300, |_| {
        temp += (200.0 - temp) * 0.05;
        Fixed1616::from_f32(temp)
    });
    println!("heater wait result: {result:?}, final duty: {:?}", output.duty.to_f32());
}
