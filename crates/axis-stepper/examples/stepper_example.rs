//! Drives a single simulated axis through an accelerate/cruise/decelerate
//! command sequence, printing each step's scheduled interval.

use axis_stepper::{AxisStepperEngine, CommandCallback, InterruptTimer, PrestepCallback, Stepper, StepperCommand};
use fixed_time::{SignedStepFixed, StepFixed, TimeType};

struct ConsoleStepper {
    name: &'static str,
    position: i32,
}

impl Stepper for ConsoleStepper {
    fn enable(&mut self, enabled: bool) {
        println!("{}: enable({enabled})", self.name);
    }
    fn set_dir(&mut self, dir: bool) {
        println!("{}: set_dir({dir})", self.name);
    }
    fn step_high(&mut self) {
        self.position += 1;
    }
    fn step_low(&mut self) {}
    fn emergency_set(&mut self, enabled: bool) {
        println!("{}: emergency_set({enabled})", self.name);
    }
}

#[derive(Default)]
struct ConsoleTimer {
    last_scheduled: u32,
}

impl InterruptTimer for ConsoleTimer {
    fn set_first(&mut self, ticks: u32) -> bool {
        self.last_scheduled = ticks;
        true
    }
    fn set_next(&mut self, ticks: u32) -> bool {
        self.last_scheduled = ticks;
        true
    }
    fn unset(&mut self) {
        println!("timer: unset");
    }
}

struct AlwaysContinue;
impl PrestepCallback for AlwaysContinue {
    fn check(&mut self) -> bool {
        false
    }
}

struct OneShot;
impl CommandCallback<16> for OneShot {
    fn next_command(&mut self) -> Option<StepperCommand<16>> {
        None
    }
}

fn main() {
    let mut engine = AxisStepperEngine::<16>::new();
    let mut stepper = ConsoleStepper { name: "X", position: 0 };
    let mut timer = ConsoleTimer::default();
    let mut prestep = AlwaysContinue;
    let mut source = OneShot;

    let cmd = StepperCommand::new(
        true,
        StepFixed::saturating_from(200),
        TimeType(20_000),
        SignedStepFixed::saturating_from(150),
    );

    engine.start(&mut stepper, &mut timer, cmd);
    println!("first interval: {} ticks", timer.last_scheduled);

    while engine.remaining_in_flight() > 0 {
        engine.on_timer_interrupt(&mut stepper, &mut timer, &mut prestep, &mut source);
    }

    println!("final position: {}", stepper.position);
}
