//! Recording mock implementations of the hardware traits `axis-stepper` and
//! `heater-control` consume, in the style of
//! `tests/integration/motion_integration_test.rs`'s `MockPort`/`MockTimer`
//! pair — adapted to this workspace's actual `Stepper`/`InterruptTimer`
//! trait shapes rather than a shared GPIO bitmask.

use axis_stepper::{CommandCallback, InterruptTimer, PrestepCallback, Stepper, StepperCommand};
use fixed_time::step::{Backing, ConstBits, SignedBacking};
use fixed_time::Fixed1616;
use heater_control::HeaterOutput;

/// A single simulated stepper motor: tracks position and enable/dir state,
/// with an optional endstop trip position for homing scenarios.
#[derive(Default)]
pub struct MockStepper {
    pub enabled: bool,
    pub dir: bool,
    pub pulse_high: bool,
    pub position: i64,
}

impl Stepper for MockStepper {
    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    fn set_dir(&mut self, dir: bool) {
        self.dir = dir;
    }
    fn step_high(&mut self) {
        self.pulse_high = true;
        self.position += if self.dir { 1 } else { -1 };
    }
    fn step_low(&mut self) {
        self.pulse_high = false;
    }
    fn emergency_set(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// A timer that just records whether it's currently armed, the way
/// `MockTimer` tracked `stopped` in the reference integration test.
#[derive(Default)]
pub struct MockTimer {
    pub armed: bool,
    pub last_ticks: u32,
}

impl InterruptTimer for MockTimer {
    fn set_first(&mut self, ticks: u32) -> bool {
        self.armed = true;
        self.last_ticks = ticks;
        true
    }
    fn set_next(&mut self, ticks: u32) -> bool {
        self.armed = true;
        self.last_ticks = ticks;
        true
    }
    fn unset(&mut self) {
        self.armed = false;
    }
}

/// An endstop that trips once a configured step count is reached, for
/// homing/abort scenarios (spec.md's "endstop hit mid-move").
pub struct TripAtStep {
    pub trip_at: u32,
    pub steps_seen: u32,
}

impl TripAtStep {
    pub fn new(trip_at: u32) -> Self {
        Self { trip_at, steps_seen: 0 }
    }
}

impl PrestepCallback for TripAtStep {
    fn check(&mut self) -> bool {
        self.steps_seen += 1;
        self.steps_seen >= self.trip_at
    }
}

/// A prestep callback that never trips, for the common non-homing case.
#[derive(Default)]
pub struct NeverTrip;

impl PrestepCallback for NeverTrip {
    fn check(&mut self) -> bool {
        false
    }
}

/// Pulls from a plain `VecDeque`-backed queue instead of a `heapless::spsc`
/// ring, since the host-side harness isn't bound by `no_std`.
#[derive(Default)]
pub struct VecCommandSource<const BITS: u32>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub queue: std::collections::VecDeque<StepperCommand<BITS>>,
}

impl<const BITS: u32> CommandCallback<BITS> for VecCommandSource<BITS>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    fn next_command(&mut self) -> Option<StepperCommand<BITS>> {
        self.queue.pop_front()
    }
}

/// Records every duty/enable write a heater channel makes, the way
/// `SimHost::record_trace` captured MCU traffic.
#[derive(Default)]
pub struct RecordingHeaterOutput {
    pub duty: Fixed1616,
    pub enabled: bool,
    pub writes: std::vec::Vec<(Fixed1616, bool)>,
}

impl HeaterOutput for RecordingHeaterOutput {
    fn set_duty(&mut self, duty: Fixed1616) {
        self.duty = duty;
        self.writes.push((duty, self.enabled));
    }
    fn enable(&mut self, on: bool) {
        self.enabled = on;
    }
}
