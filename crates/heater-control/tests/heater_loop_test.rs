//! End-to-end heater loop scenarios: wait-with-timeout and thermal-runaway
//! latching.

use fixed_time::{Fixed1616, TimeType};
use heater_control::{
    FixedPid, HeaterCommand, HeaterCommandOutcome, HeaterConfig, HeaterControlLoop, HeaterError,
    HeaterFault, HeaterOutput, SafetyLimits,
};

fn f(v: f32) -> Fixed1616 {
    Fixed1616::from_f32(v)
}

struct RecordingOutput {
    duty: Fixed1616,
    enabled: bool,
}

impl Default for RecordingOutput {
    fn default() -> Self {
        Self { duty: Fixed1616::ZERO, enabled: true }
    }
}

impl HeaterOutput for RecordingOutput {
    fn set_duty(&mut self, duty: Fixed1616) {
        self.duty = duty;
    }
    fn enable(&mut self, on: bool) {
        self.enabled = on;
    }
}

fn config() -> HeaterConfig {
    HeaterConfig {
        safety: SafetyLimits {
            min_safe_temp: f(-20.0),
            max_safe_temp: f(280.0),
            min_heat_gain_temp: f(2.0),
            min_heat_gain_ticks: 20,
        },
        min_extrusion_temp: f(170.0),
        dt: f(1.0),
        in_range_hysteresis: f(2.0),
    }
}

fn loop_with_one_heater(wait_timeout_ticks: u32, wait_report_period_ticks: u32) -> HeaterControlLoop<1, 1, FixedPid> {
    HeaterControlLoop::new(
        [config()],
        [FixedPid::new(f(5.0), f(0.1), f(1.0), Fixed1616::ONE)],
        wait_timeout_ticks,
        wait_report_period_ticks,
    )
    .unwrap()
}

/// A heater whose heating-rate check never fires, isolating the
/// wait-timeout path from the thermal-runaway latch.
fn loop_with_no_runaway_check(wait_timeout_ticks: u32, wait_report_period_ticks: u32) -> HeaterControlLoop<1, 1, FixedPid> {
    let mut cfg = config();
    cfg.safety.min_heat_gain_ticks = u32::MAX;
    HeaterControlLoop::new([cfg], [FixedPid::new(f(5.0), f(0.1), f(1.0), Fixed1616::ONE)], wait_timeout_ticks, wait_report_period_ticks).unwrap()
}

#[test]
fn wait_times_out_when_heater_never_reaches_target() {
    let mut loop_ = loop_with_no_runaway_check(300, 30);
    let mut output = RecordingOutput::default();

    let outcome = loop_.dispatch(TimeType(0), HeaterCommand::SetTargetAndWait { heater: 0, target: f(200.0) }).unwrap();
    assert_eq!(outcome, HeaterCommandOutcome::WaitStarted);

    let mut t = 0u32;
    let mut result = None;
    while t <= 300 {
        loop_.channel(0).unwrap().tick(TimeType(t), f(20.0), &mut output).unwrap();
        if let Some(r) = loop_.poll_wait(TimeType(t)) {
            result = Some(r);
            break;
        }
        t += 1;
    }

    assert_eq!(result, Some(Err(HeaterError::WaitTimedOut)));
    // The target set by M109 stays in place even though the wait failed.
    assert_eq!(loop_.channel(0).unwrap().target(), f(200.0));
}

#[test]
fn wait_completes_once_heater_settles_in_range() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let mut output = RecordingOutput::default();

    loop_.dispatch(TimeType(0), HeaterCommand::SetTargetAndWait { heater: 0, target: f(200.0) }).unwrap();

    // Heater reaches target well within the hysteresis band immediately.
    loop_.channel(0).unwrap().tick(TimeType(1), f(199.5), &mut output).unwrap();
    let result = loop_.poll_wait(TimeType(1));

    assert_eq!(result, Some(Ok(())));
    assert!(!loop_.is_waiting());
}

#[test]
fn open_circuit_reading_latches_the_heater_off_within_one_control_interval() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let mut output = RecordingOutput::default();

    loop_.dispatch(TimeType(0), HeaterCommand::SetTarget { heater: 0, target: f(200.0) }).unwrap();

    // ADC open-circuit reads as an implausibly high temperature.
    let fault = loop_.channel(0).unwrap().tick(TimeType(1), f(400.0), &mut output).unwrap_err();
    assert_eq!(fault, HeaterFault::TempTooHigh);
    assert!(!output.enabled);
    assert_eq!(output.duty, Fixed1616::ZERO);

    // The fault stays latched and is still observable on the next tick's report.
    let still_latched = loop_.channel(0).unwrap().tick(TimeType(2), f(25.0), &mut output).unwrap_err();
    assert_eq!(still_latched, HeaterFault::TempTooHigh);
    assert_eq!(loop_.channel(0).unwrap().latched(), Some(HeaterFault::TempTooHigh));
}

#[test]
fn wait_fails_fast_if_the_heater_latches_mid_wait() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let mut output = RecordingOutput::default();

    loop_.dispatch(TimeType(0), HeaterCommand::SetTargetAndWait { heater: 0, target: f(200.0) }).unwrap();
    loop_.channel(0).unwrap().tick(TimeType(1), f(400.0), &mut output).unwrap_err();

    let result = loop_.poll_wait(TimeType(1));
    assert_eq!(result, Some(Err(HeaterError::HeaterThermalRunaway)));
}

#[test]
fn waiting_on_a_heater_with_no_target_is_rejected_up_front() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let err = loop_.dispatch(TimeType(0), HeaterCommand::WaitForHeaters { heaters: heapless::Vec::new() }).err();
    // An empty wait list trivially "completes"; the not-enabled case is
    // exercised by waiting on a heater that was never given a target.
    assert!(err.is_none());

    let mut heaters = heapless::Vec::new();
    heaters.push(0u8).unwrap();
    let err = loop_.dispatch(TimeType(0), HeaterCommand::WaitForHeaters { heaters }).unwrap_err();
    assert_eq!(err, HeaterError::HeaterNotEnabled);
}

#[test]
fn cold_extrusion_is_blocked_below_min_extrusion_temp_unless_permitted() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let mut output = RecordingOutput::default();
    loop_.channel(0).unwrap().tick(TimeType(0), f(25.0), &mut output).unwrap();
    assert!(!loop_.channel(0).unwrap().extrusion_safe());

    loop_.dispatch(TimeType(0), HeaterCommand::ColdExtrusionPermit { heater: 0, permitted: true }).unwrap();
    assert!(loop_.channel(0).unwrap().extrusion_safe());
}

#[test]
fn clearing_a_latch_allows_the_heater_to_run_again() {
    let mut loop_ = loop_with_one_heater(300, 30);
    let mut output = RecordingOutput::default();
    loop_.channel(0).unwrap().tick(TimeType(0), f(400.0), &mut output).unwrap_err();
    assert!(loop_.channel(0).unwrap().latched().is_some());

    loop_.dispatch(TimeType(1), HeaterCommand::ClearLatchedError { heater: 0 }).unwrap();
    assert!(loop_.channel(0).unwrap().latched().is_none());

    loop_.dispatch(TimeType(1), HeaterCommand::SetTarget { heater: 0, target: f(200.0) }).unwrap();
    let duty = loop_.channel(0).unwrap().tick(TimeType(2), f(25.0), &mut output).unwrap();
    assert!(duty > Fixed1616::ZERO);
}
