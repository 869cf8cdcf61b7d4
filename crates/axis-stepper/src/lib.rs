#![cfg_attr(not(test), no_std)]
#![deny(clippy::all)]

//! # Axis Stepper Driver
//!
//! The hard-real-time engine that turns one [`StepperCommand`] into exactly
//! `x` step pulses spread over `t` ticks, following the quadratic step-time
//! polynomial in [`timing`]. One [`AxisStepperEngine`] drives one physical
//! axis from its own hardware timer interrupt; the motion planner feeds each
//! axis's queue independently (see `motion-planner`), so there is no shared
//! bitmask of "which motors step this tick" the way a single combined ISR
//! would need.
//!
//! ## Dispatch contract
//!
//! `start(cmd)` primes the ramp and arms the timer for the first step.
//! `on_timer_interrupt` then, every time it fires:
//!
//! 1. Lowers the pulse pin if it is still high from the previous step
//!    (the minimum pulse width is guaranteed by the planner never emitting
//!    a `t`/`x` ratio below [`AxisStepperEngine::MIN_STEP_PULSE_WIDTH`]).
//! 2. Invokes the prestep callback (endstop check); a `true` return aborts
//!    the move — no further step, no further command, `aborted` latches.
//! 3. Otherwise raises the pulse pin, advances the step index, and arms the
//!    timer for the next step.
//! 4. On exhausting the command's step count, invokes the command callback
//!    to pull the next command; returning `None` stops the timer.
//!
//! The whole path is wait-free: no locks beyond the single critical section
//! guarding the `aborted` flag, no division, no allocation.

mod timing;

pub use timing::StepTiming;

use core::sync::atomic::{AtomicBool, Ordering};
use fixed_time::step::{Backing, ConstBits, SignedBacking};
use fixed_time::{SignedStepFixed, StepFixed, TimeType};
use heapless::spsc::Consumer;

/// One planner-emitted command: step `x` times over `t` ticks in direction
/// `dir`, under acceleration parameter `a` (`|a| <= x`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct StepperCommand<const BITS: u32>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub dir: bool,
    pub x: StepFixed<BITS>,
    pub t: TimeType,
    pub a: SignedStepFixed<BITS>,
}

impl<const BITS: u32> StepperCommand<BITS>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub const fn new(dir: bool, x: StepFixed<BITS>, t: TimeType, a: SignedStepFixed<BITS>) -> Self {
        Self { dir, x, t, a }
    }
}

/// A single stepper's direction and pulse pins.
///
/// ISR-callable: `set_dir`, `step_high`, `step_low` must complete in O(1)
/// with no blocking, since they run from interrupt context.
pub trait Stepper {
    fn enable(&mut self, enabled: bool);
    fn set_dir(&mut self, dir: bool);
    fn step_high(&mut self);
    fn step_low(&mut self);
    /// Hard-disables the driver outright, bypassing the normal enable path,
    /// for fault handling (thermal runaway, endstop abort propagation).
    fn emergency_set(&mut self, enabled: bool);
}

/// The hardware timer driving this axis's ISR.
pub trait InterruptTimer {
    /// Arms the timer to fire `ticks` ticks from now; returns `true` to
    /// keep firing (mirrors the `InterruptTimer::setFirst`/`setNext`
    /// contract's continue/stop return).
    fn set_first(&mut self, ticks: u32) -> bool;
    fn set_next(&mut self, ticks: u32) -> bool;
    fn unset(&mut self);
}

/// Endstop / homing hook, invoked immediately before each step pulse.
/// Returning `true` aborts the move.
pub trait PrestepCallback {
    fn check(&mut self) -> bool;
}

/// Supplies the next command once the current one is exhausted. Returning
/// `None` stops the axis (matches the driver's `CommandCallback` contract).
pub trait CommandCallback<const BITS: u32>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    fn next_command(&mut self) -> Option<StepperCommand<BITS>>;
}

/// Pulls directly from a `heapless::spsc` queue — the default source when a
/// command callback doesn't need to do anything beyond dequeuing.
pub struct QueueCommandSource<'q, const BITS: u32, const CAP: usize>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    consumer: Consumer<'q, StepperCommand<BITS>, CAP>,
}

impl<'q, const BITS: u32, const CAP: usize> QueueCommandSource<'q, BITS, CAP>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub fn new(consumer: Consumer<'q, StepperCommand<BITS>, CAP>) -> Self {
        Self { consumer }
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.len() == 0
    }
}

impl<'q, const BITS: u32, const CAP: usize> CommandCallback<BITS> for QueueCommandSource<'q, BITS, CAP>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    fn next_command(&mut self) -> Option<StepperCommand<BITS>> {
        self.consumer.dequeue()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DriveState<const BITS: u32> {
    Idle,
    Active { remaining: u32, timing: StepTiming },
}

/// Drives one axis's pulse/direction pins from its own timer interrupt.
///
/// `MIN_STEP_PULSE_WIDTH` is the minimum number of ticks the pulse pin must
/// stay high; the planner is responsible for never emitting a command whose
/// per-step interval would violate it (see `motion-planner`'s segment
/// construction, step 2's `syncMinStepTime`/`asyncMinStepTime` bound).
pub struct AxisStepperEngine<const BITS: u32> {
    state: DriveState<BITS>,
    pulse_high: bool,
    position: i64,
    aborted: AtomicBool,
    aborted_remaining: u32,
}

impl<const BITS: u32> AxisStepperEngine<BITS>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub const MIN_STEP_PULSE_WIDTH: u32 = 2;

    pub const fn new() -> Self {
        Self {
            state: DriveState::Idle,
            pulse_high: false,
            position: 0,
            aborted: AtomicBool::new(false),
            aborted_remaining: 0,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Remaining unexecuted steps of the command currently in flight, used
    /// by abort-time step accounting (§5 "Cancellation").
    pub fn remaining_in_flight(&self) -> u32 {
        match self.state {
            DriveState::Idle => 0,
            DriveState::Active { remaining, .. } => remaining,
        }
    }

    /// Unexecuted steps of the command that was active at the moment this
    /// engine last aborted — the "currently-active command's remainder"
    /// term of the per-axis unexecuted step count reported on cancellation
    /// (§5 "Cancellation"). Zero if the engine has never aborted mid-command.
    /// Unlike `remaining_in_flight`, this survives the state going `Idle`
    /// on abort.
    pub fn aborted_remaining(&self) -> u32 {
        self.aborted_remaining
    }

    /// Primes the engine with the first command and arms the timer. Call
    /// once after enqueuing the initial commit batch, before the first
    /// interrupt is expected.
    pub fn start<S, T>(&mut self, stepper: &mut S, timer: &mut T, cmd: StepperCommand<BITS>)
    where
        S: Stepper,
        T: InterruptTimer,
    {
        self.aborted.store(false, Ordering::Release);
        stepper.set_dir(cmd.dir);
        let x = cmd.x.get();
        if x == 0 {
            self.state = DriveState::Idle;
            timer.unset();
            return;
        }
        let mut timing = StepTiming::prime(x, cmd.t.0, cmd.a.get());
        let first = timing.next_ticks();
        self.state = DriveState::Active { remaining: x, timing };
        timer.set_first(first);
    }

    /// Task-context hard abort: used by the fault path (thermal runaway
    /// propagation, external `M112`-style emergency stop) rather than the
    /// ISR's own prestep-triggered abort. Disables the driver and latches
    /// `aborted` inside a single critical section, the "documented lock
    /// region" the ISR path never otherwise needs — it must be held for at
    /// most one step-time computation, matching the timer contract's
    /// `InterruptTempLock` budget.
    pub fn emergency_abort<S, T>(&mut self, stepper: &mut S, timer: &mut T)
    where
        S: Stepper,
        T: InterruptTimer,
    {
        critical_section::with(|_cs| {
            let remaining = match self.state {
                DriveState::Idle => 0,
                DriveState::Active { remaining, .. } => remaining,
            };
            stepper.emergency_set(false);
            timer.unset();
            self.state = DriveState::Idle;
            self.aborted_remaining = remaining;
            self.aborted.store(true, Ordering::Release);
        });
    }

    /// The interrupt handler. Must be called from the axis's hardware timer
    /// ISR. `source` supplies the next command once the current one runs out.
    #[inline(always)]
    pub fn on_timer_interrupt<S, T, P, C>(
        &mut self,
        stepper: &mut S,
        timer: &mut T,
        prestep: &mut P,
        source: &mut C,
    ) where
        S: Stepper,
        T: InterruptTimer,
        P: PrestepCallback,
        C: CommandCallback<BITS>,
    {
        if self.pulse_high {
            stepper.step_low();
            self.pulse_high = false;
        }

        let (remaining, timing) = match &mut self.state {
            DriveState::Active { remaining, timing } => (remaining, timing),
            DriveState::Idle => {
                timer.unset();
                return;
            }
        };

        if prestep.check() {
            self.aborted_remaining = *remaining;
            self.aborted.store(true, Ordering::Release);
            self.state = DriveState::Idle;
            timer.unset();
            return;
        }

        stepper.step_high();
        self.pulse_high = true;
        self.position += 1;
        *remaining -= 1;

        if *remaining == 0 {
            match source.next_command() {
                Some(next) => {
                    stepper.set_dir(next.dir);
                    let x = next.x.get();
                    if x == 0 {
                        self.state = DriveState::Idle;
                        timer.unset();
                        return;
                    }
                    let mut next_timing = StepTiming::prime(x, next.t.0, next.a.get());
                    let first = next_timing.next_ticks();
                    self.state = DriveState::Active { remaining: x, timing: next_timing };
                    timer.set_next(first);
                }
                None => {
                    self.state = DriveState::Idle;
                    timer.unset();
                }
            }
        } else {
            let next_interval = timing.next_ticks();
            timer.set_next(next_interval);
        }
    }
}

impl<const BITS: u32> Default for AxisStepperEngine<BITS>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixed_time::{SignedStepFixed, StepFixed, TimeType};

    type Bits = StepFixed<16>;
    type SBits = SignedStepFixed<16>;

    #[derive(Default)]
    struct MockStepper {
        dir: bool,
        high_count: u32,
        low_count: u32,
        enabled: bool,
    }

    impl Stepper for MockStepper {
        fn enable(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn set_dir(&mut self, dir: bool) {
            self.dir = dir;
        }
        fn step_high(&mut self) {
            self.high_count += 1;
        }
        fn step_low(&mut self) {
            self.low_count += 1;
        }
        fn emergency_set(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    #[derive(Default)]
    struct MockTimer {
        scheduled: Option<u32>,
        unset: bool,
    }

    impl InterruptTimer for MockTimer {
        fn set_first(&mut self, ticks: u32) -> bool {
            self.scheduled = Some(ticks);
            self.unset = false;
            true
        }
        fn set_next(&mut self, ticks: u32) -> bool {
            self.scheduled = Some(ticks);
            self.unset = false;
            true
        }
        fn unset(&mut self) {
            self.unset = true;
        }
    }

    struct NeverAbort;
    impl PrestepCallback for NeverAbort {
        fn check(&mut self) -> bool {
            false
        }
    }

    struct AbortAtStep {
        remaining_until_abort: u32,
    }
    impl PrestepCallback for AbortAtStep {
        fn check(&mut self) -> bool {
            if self.remaining_until_abort == 0 {
                true
            } else {
                self.remaining_until_abort -= 1;
                false
            }
        }
    }

    struct NoMoreCommands;
    impl CommandCallback<16> for NoMoreCommands {
        fn next_command(&mut self) -> Option<StepperCommand<16>> {
            None
        }
    }

    #[test]
    fn drives_exactly_x_steps_and_stops() {
        let mut engine = AxisStepperEngine::<16>::new();
        let mut stepper = MockStepper::default();
        let mut timer = MockTimer::default();
        let cmd = StepperCommand::new(true, Bits::saturating_from(5), TimeType(500), SBits::zero());

        engine.start(&mut stepper, &mut timer, cmd);
        let mut prestep = NeverAbort;
        let mut source = NoMoreCommands;
        for _ in 0..5 {
            engine.on_timer_interrupt(&mut stepper, &mut timer, &mut prestep, &mut source);
        }

        assert_eq!(stepper.high_count, 5);
        assert_eq!(engine.position(), 5);
        assert!(timer.unset);
        assert!(!engine.aborted());
    }

    #[test]
    fn prestep_abort_latches_flag_and_stops_mid_move() {
        let mut engine = AxisStepperEngine::<16>::new();
        let mut stepper = MockStepper::default();
        let mut timer = MockTimer::default();
        let cmd = StepperCommand::new(true, Bits::saturating_from(100), TimeType(10_000), SBits::zero());

        engine.start(&mut stepper, &mut timer, cmd);
        let mut prestep = AbortAtStep { remaining_until_abort: 36 };
        let mut source = NoMoreCommands;
        for _ in 0..40 {
            engine.on_timer_interrupt(&mut stepper, &mut timer, &mut prestep, &mut source);
            if engine.aborted() {
                break;
            }
        }

        assert!(engine.aborted());
        assert_eq!(stepper.high_count, 37);
        assert_eq!(engine.remaining_in_flight(), 0);
        // 100-step move, 37 steps executed before the abort: 63 left unexecuted.
        assert_eq!(engine.aborted_remaining(), 63);
        assert!(timer.unset);
    }

    #[test]
    fn pulse_pin_is_lowered_before_the_next_step_is_raised() {
        let mut engine = AxisStepperEngine::<16>::new();
        let mut stepper = MockStepper::default();
        let mut timer = MockTimer::default();
        let cmd = StepperCommand::new(true, Bits::saturating_from(3), TimeType(300), SBits::zero());

        engine.start(&mut stepper, &mut timer, cmd);
        let mut prestep = NeverAbort;
        let mut source = NoMoreCommands;
        engine.on_timer_interrupt(&mut stepper, &mut timer, &mut prestep, &mut source);
        assert_eq!(stepper.low_count, 0); // nothing was high before the first step
        engine.on_timer_interrupt(&mut stepper, &mut timer, &mut prestep, &mut source);
        assert_eq!(stepper.low_count, 1);
    }

    #[test]
    fn emergency_abort_latches_flag_and_disables_driver() {
        let mut engine = AxisStepperEngine::<16>::new();
        let mut stepper = MockStepper::default();
        let mut timer = MockTimer::default();
        let cmd = StepperCommand::new(true, Bits::saturating_from(100), TimeType(10_000), SBits::zero());
        engine.start(&mut stepper, &mut timer, cmd);

        engine.emergency_abort(&mut stepper, &mut timer);

        assert!(engine.aborted());
        assert!(!stepper.enabled);
        assert!(timer.unset);
        assert_eq!(engine.remaining_in_flight(), 0);
        assert_eq!(engine.aborted_remaining(), 100);
    }

    #[test]
    fn zero_length_command_schedules_no_steps() {
        let mut engine = AxisStepperEngine::<16>::new();
        let mut stepper = MockStepper::default();
        let mut timer = MockTimer::default();
        let cmd = StepperCommand::new(true, Bits::zero(), TimeType(0), SBits::zero());

        engine.start(&mut stepper, &mut timer, cmd);
        assert!(timer.unset);
        assert_eq!(engine.remaining_in_flight(), 0);
    }
}
