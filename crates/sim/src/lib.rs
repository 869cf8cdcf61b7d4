//! # In-Process Simulation Harness
//!
//! A deterministic, host-side harness that wires `motion-planner`,
//! `axis-stepper`, and `heater-control` together against recording mock
//! hardware, for integration tests and CI that need the full pipeline
//! without real hardware or a wire protocol to a separate MCU process.

pub mod error;
pub mod harness;
pub mod heater_harness;
pub mod mock_hw;

pub use error::SimError;
pub use harness::{default_test_config, raw_move, run_to_completion, AxisOutcome, FixedMoveSource, TraceEntry};
pub use heater_harness::{run_wait_to_completion, wait_for_target};
