//! # Heater Control Task
//!
//! Samples the extruder thermistor, runs it through a Steinhart-Hart
//! conversion and a low-pass filter, and drives the result through a single
//! `heater-control` channel onto a GPIO pin. There is no PWM peripheral
//! wired up here: the duty fraction `HeaterChannel::tick` returns is
//! thresholded into a plain on/off GPIO write, since the ADC/PWM
//! peripherals themselves are platform drivers this firmware only consumes
//! through a trait, not something this workspace implements concretely
//! beyond this one example.

use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::{AnyPin, Level, Output, Speed};
use embassy_stm32::peripherals::ADC1;
use embassy_time::{Duration, Timer};

use fixed_time::{Fixed1616, TimeType};
use heater_control::{Filter, FixedPid, HeaterChannel, HeaterConfig, HeaterOutput, LowPassFilter, SafetyLimits, SteinhartHart, Thermistor};

const SAMPLE_PERIOD_MS: u64 = 250;

struct GpioHeaterOutput {
    pin: Output<'static>,
}

impl HeaterOutput for GpioHeaterOutput {
    fn set_duty(&mut self, duty: Fixed1616) {
        if duty >= Fixed1616::from_f32(0.5) {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn enable(&mut self, on: bool) {
        if !on {
            self.pin.set_low();
        }
    }
}

fn extruder_config() -> HeaterConfig {
    HeaterConfig {
        safety: SafetyLimits {
            min_safe_temp: Fixed1616::from_f32(-10.0),
            max_safe_temp: Fixed1616::from_f32(280.0),
            min_heat_gain_temp: Fixed1616::from_f32(2.0),
            min_heat_gain_ticks: 20,
        },
        min_extrusion_temp: Fixed1616::from_f32(170.0),
        dt: Fixed1616::from_f32(SAMPLE_PERIOD_MS as f32 / 1000.0),
        in_range_hysteresis: Fixed1616::from_f32(2.0),
    }
}

/// Samples, filters, and closes the loop on the extruder heater once every
/// [`SAMPLE_PERIOD_MS`]. Runs forever, the way the control loop's soft
/// real-time contract expects a steady tick rate rather than a one-shot.
#[embassy_executor::task]
pub async fn heater_task(adc: ADC1, temp_pin: AnyPin, heater_pin: AnyPin) {
    defmt::info!("Heater task started");

    let mut adc = Adc::new(adc);
    let mut temp_pin = temp_pin;
    let mut output = GpioHeaterOutput { pin: Output::new(heater_pin, Level::Low, Speed::Low) };

    let thermistor = SteinhartHart::new(4700.0f32, 4095.0, 0.00078864, 0.00020845, 0.00000012506);
    let mut filter = LowPassFilter::new(0.2f32, 25.0);

    let mut channel = HeaterChannel::new(
        extruder_config(),
        FixedPid::new(Fixed1616::from_f32(5.0), Fixed1616::from_f32(0.1), Fixed1616::from_f32(1.0), Fixed1616::ONE),
    )
    .expect("extruder heater config is valid");

    let mut now = TimeType::ZERO;
    loop {
        Timer::after(Duration::from_millis(SAMPLE_PERIOD_MS)).await;
        now = now.wrapping_add(1);

        let raw = adc.blocking_read(&mut temp_pin) as f32;
        filter.add_sample(thermistor.adc_to_temperature(raw) - 273.15);
        let temp_c = Fixed1616::from_f32(filter.output());

        if let Err(fault) = channel.tick(now, temp_c, &mut output) {
            defmt::warn!("extruder heater latched: {:?}", defmt::Debug2Format(&fault));
        }
    }
}
