#![cfg_attr(not(test), no_std)]
//! Soft-real-time heater control: per-heater PID loop, absolute-range and
//! heating-rate thermal-runaway protection, and the wait/M-command protocol
//! (`M104`/`M109`/`M116`/`M302`/...) the aux-control core exposes.

pub mod command;
pub mod controller;
pub mod error;
pub mod filter;
pub mod pid;
pub mod safety;
pub mod thermistor;

pub use command::{HeaterCommand, HeaterId, FanId, MAX_WAIT_HEATERS};
pub use controller::{HeaterChannel, HeaterCommandOutcome, HeaterConfig, HeaterControlLoop, HeaterOutput, HeaterReport};
pub use error::{HeaterConfigError, HeaterError};
pub use filter::{Filter, LowPassFilter, MovingAverageFilter};
pub use pid::{FixedPid, HeaterController};
pub use safety::{HeaterFault, HeaterSafety, SafetyLimits};
pub use thermistor::{SteinhartHart, Thermistor};
