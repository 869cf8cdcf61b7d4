//! Drives a single simulated heater through a `SetTargetAndWait` command,
//! printing the control loop's duty and temperature every tick.

use fixed_time::{Fixed1616, TimeType};
use heater_control::{
    FixedPid, HeaterCommand, HeaterConfig, HeaterControlLoop, HeaterOutput, SafetyLimits,
};

fn f(v: f32) -> Fixed1616 {
    Fixed1616::from_f32(v)
}

/// A crude first-order heater/ambient model: duty heats, proportional loss cools.
struct HeaterModel {
    temp: f32,
    ambient: f32,
    heat_coefficient: f32,
    cooling_coefficient: f32,
}

impl HeaterModel {
    fn step(&mut self, duty: f32, dt: f32) {
        let heating = duty * self.heat_coefficient * dt;
        let cooling = (self.temp - self.ambient) * self.cooling_coefficient * dt;
        self.temp += heating - cooling;
    }
}

struct ConsolePwm;
impl HeaterOutput for ConsolePwm {
    fn set_duty(&mut self, _duty: Fixed1616) {}
    fn enable(&mut self, _on: bool) {}
}

fn main() {
    let config = HeaterConfig {
        safety: SafetyLimits {
            min_safe_temp: f(-20.0),
            max_safe_temp: f(280.0),
            min_heat_gain_temp: f(2.0),
            min_heat_gain_ticks: 20,
        },
        min_extrusion_temp: f(170.0),
        dt: f(0.5),
        in_range_hysteresis: f(1.5),
    };
    let mut control: HeaterControlLoop<1, 0, FixedPid> = HeaterControlLoop::new(
        [config],
        [FixedPid::new(f(10.0), f(0.1), f(5.0), Fixed1616::ONE)],
        600,
        60,
    )
    .expect("config passes validation");

    let mut model = HeaterModel { temp: 25.0, ambient: 25.0, heat_coefficient: 2.5, cooling_coefficient: 0.1 };
    let mut output = ConsolePwm;

    control.dispatch(TimeType(0), HeaterCommand::SetTargetAndWait { heater: 0, target: f(210.0) }).unwrap();

    println!("tick, temp, duty");
    for t in 0u32..720 {
        let duty = control.channel(0).unwrap().tick(TimeType(t), f(model.temp), &mut output);
        let duty_f = duty.unwrap_or(Fixed1616::ZERO).to_f32();
        model.step(duty_f, 0.5);
        println!("{t}, {:.2}, {:.3}", model.temp, duty_f);

        if let Some(result) = control.poll_wait(TimeType(t)) {
            println!("wait finished: {result:?}");
            break;
        }
    }
}
