//! # Stepper Motor Control
//!
//! Wires `axis-stepper`'s `AxisStepperEngine` to a pair of GPIO pins per
//! axis. There is no hardware capture-compare interrupt wiring here — the
//! task loop below stands in for the timer ISR, awaiting the tick interval
//! `on_timer_interrupt` asks for and then calling it directly. A real board
//! would instead arm a hardware timer and call `on_timer_interrupt` from its
//! interrupt handler, with the `embassy_time::Timer::after` below replaced
//! by the timer peripheral firing.

use axis_stepper::{AxisStepperEngine, CommandCallback, InterruptTimer, PrestepCallback, Stepper, StepperCommand};
use embassy_stm32::gpio::{AnyPin, Level, Output, Speed};
use embassy_time::{Duration, Timer};
use fixed_time::{SignedStepFixed, StepFixed, TimeType};

/// One tick of the axis stepper's time base, in microseconds. Chosen to
/// keep the demo's step rate in a visible, easy-to-probe range rather than
/// matching any particular motor's real timing.
const TICK_MICROS: u64 = 10;

pub struct GpioStepper {
    step: Output<'static>,
    dir: Output<'static>,
    enabled: bool,
}

impl GpioStepper {
    pub fn new(step_pin: AnyPin, dir_pin: AnyPin) -> Self {
        Self {
            step: Output::new(step_pin, Level::Low, Speed::VeryHigh),
            dir: Output::new(dir_pin, Level::Low, Speed::VeryHigh),
            enabled: false,
        }
    }
}

impl Stepper for GpioStepper {
    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_dir(&mut self, dir: bool) {
        if dir {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
    }

    fn step_high(&mut self) {
        self.step.set_high();
    }

    fn step_low(&mut self) {
        self.step.set_low();
    }

    fn emergency_set(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.step.set_low();
        }
    }
}

/// Stands in for the hardware timer: records the tick count the engine
/// asked for next, which the task loop then awaits with `embassy_time`.
#[derive(Default)]
pub struct SoftTimer {
    next_ticks: Option<u32>,
}

impl InterruptTimer for SoftTimer {
    fn set_first(&mut self, ticks: u32) -> bool {
        self.next_ticks = Some(ticks);
        true
    }

    fn set_next(&mut self, ticks: u32) -> bool {
        self.next_ticks = Some(ticks);
        true
    }

    fn unset(&mut self) {
        self.next_ticks = None;
    }
}

/// No endstop wired up in this demo; homing is out of scope here.
struct NoEndstop;

impl PrestepCallback for NoEndstop {
    fn check(&mut self) -> bool {
        false
    }
}

/// Repeats a single canned move forever, since there is no G-code source
/// feeding this demo binary real commands.
struct RepeatingMove {
    command: StepperCommand<13>,
}

impl CommandCallback<13> for RepeatingMove {
    fn next_command(&mut self) -> Option<StepperCommand<13>> {
        Some(self.command)
    }
}

async fn run_axis(mut gpio: GpioStepper, command: StepperCommand<13>) {
    gpio.enable(true);
    let mut engine = AxisStepperEngine::<13>::new();
    let mut timer = SoftTimer::default();
    let mut prestep = NoEndstop;
    let mut source = RepeatingMove { command };

    engine.start(&mut gpio, &mut timer, command);
    loop {
        let Some(ticks) = timer.next_ticks else {
            break;
        };
        Timer::after(Duration::from_micros(ticks as u64 * TICK_MICROS)).await;
        engine.on_timer_interrupt(&mut gpio, &mut timer, &mut prestep, &mut source);
        if engine.aborted() {
            break;
        }
    }
}

/// Steps the X axis back and forth in place — there is no G-code dispatch
/// in this demo, so the move is the same canned command every pass.
#[embassy_executor::task]
pub async fn stepper_x_task(gpio: GpioStepper) {
    defmt::info!("Stepper X task started");
    let command = StepperCommand::<13>::new(true, StepFixed::saturating_from(400), TimeType(4000), SignedStepFixed::zero());
    run_axis(gpio, command).await;
}

#[embassy_executor::task]
pub async fn stepper_y_task(gpio: GpioStepper) {
    defmt::info!("Stepper Y task started");
    let command = StepperCommand::<13>::new(false, StepFixed::saturating_from(400), TimeType(4000), SignedStepFixed::zero());
    run_axis(gpio, command).await;
}
