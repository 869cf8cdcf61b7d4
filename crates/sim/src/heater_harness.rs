//! Thin harness around a single-heater `HeaterControlLoop`, for scenarios
//! that need a heater ticking alongside (or gating) motion in an
//! integration test rather than heater-control's own unit tests.

use fixed_time::TimeType;
use heater_control::{FixedPid, HeaterCommand, HeaterCommandOutcome, HeaterControlLoop, HeaterError};

use crate::mock_hw::RecordingHeaterOutput;

/// Ticks `loop_` once per step of `temperature_at(tick)` until the
/// in-flight wait resolves or `max_ticks` elapses, returning the outcome
/// and the recorded duty/enable trace.
pub fn run_wait_to_completion<const HEATERS: usize, const FANS: usize>(
    loop_: &mut HeaterControlLoop<HEATERS, FANS, FixedPid>,
    heater: u8,
    max_ticks: u32,
    mut temperature_at: impl FnMut(u32) -> fixed_time::Fixed1616,
) -> (Result<(), HeaterError>, RecordingHeaterOutput) {
    let mut output = RecordingHeaterOutput::default();
    for t in 0..max_ticks {
        let now = TimeType(t);
        let _ = loop_.channel(heater).expect("heater index in range").tick(now, temperature_at(t), &mut output);
        if let Some(result) = loop_.poll_wait(now) {
            tracing::debug!(?result, tick = t, "heater wait resolved");
            return (result, output);
        }
    }
    (Err(HeaterError::WaitTimedOut), output)
}

/// Starts a `SetTargetAndWait` and drives it with [`run_wait_to_completion`].
pub fn wait_for_target<const HEATERS: usize, const FANS: usize>(
    loop_: &mut HeaterControlLoop<HEATERS, FANS, FixedPid>,
    heater: u8,
    target: fixed_time::Fixed1616,
    max_ticks: u32,
    temperature_at: impl FnMut(u32) -> fixed_time::Fixed1616,
) -> (Result<(), HeaterError>, RecordingHeaterOutput) {
    let outcome = loop_.dispatch(TimeType(0), HeaterCommand::SetTargetAndWait { heater, target }).expect("dispatch accepted");
    debug_assert_eq!(outcome, HeaterCommandOutcome::WaitStarted);
    run_wait_to_completion(loop_, heater, max_ticks, temperature_at)
}
