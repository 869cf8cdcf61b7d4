#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]

use defmt_rtt as _; // global logger
use panic_probe as _;

// Application Modules
pub mod adc;
pub mod stepper;

// `boards/` sits outside `src/` (one board support package per target),
// so it is pulled in here by path rather than as a workspace member.
mod boards {
    pub mod stm32f407 {
        #[path = "../../boards/stm32f407/pins.rs"]
        pub mod pins;
    }
}

mod embassy_main;
use embassy_main as _;
