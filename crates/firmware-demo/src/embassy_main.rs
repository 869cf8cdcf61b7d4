//! # Embassy Main
//!
//! This is the main entry point for the firmware when using the Embassy executor.
//! It initializes the hardware, spawns all the concurrent tasks, and then lets the
//! executor take over.

use crate::boards::stm32f407::pins::BoardPins;
use crate::{adc, stepper};
use embassy_executor::Spawner;
use embassy_stm32::Config;

/// The main asynchronous function that sets up and runs the firmware.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!("Initializing firmware...");

    // Board-specific configuration and initialization.
    let config = Config::default();
    // Configure clocks here if needed, e.g., for high-speed stepping.
    // config.rcc.hse = Some(embassy_stm32::rcc::Hse { ... });
    let p = embassy_stm32::init(config);
    let board_pins = BoardPins::new(p);

    // Spawn all the concurrent tasks. The spawner runs each in the
    // background; the motion and heater cores never share state directly,
    // so there is no synchronization between these tasks beyond the GPIO
    // pins each one owns exclusively.
    spawner
        .spawn(stepper::stepper_x_task(stepper::GpioStepper::new(board_pins.stepper_x_step, board_pins.stepper_x_dir)))
        .unwrap();
    spawner
        .spawn(stepper::stepper_y_task(stepper::GpioStepper::new(board_pins.stepper_y_step, board_pins.stepper_y_dir)))
        .unwrap();
    spawner.spawn(adc::heater_task(board_pins.adc1, board_pins.temp_extruder, board_pins.heater_extruder)).unwrap();
    spawner.spawn(led_task(board_pins.led)).unwrap();

    defmt::info!("Initialization complete. All tasks are running.");
}

/// A simple task to blink the LED, indicating that the firmware is running.
#[embassy_executor::task]
async fn led_task(led_pin: embassy_stm32::gpio::AnyPin) {
    use embassy_stm32::gpio::{Level, Output, Speed};
    use embassy_time::{Duration, Timer};
    let mut led = Output::new(led_pin, Level::High, Speed::Low);

    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
