#![no_std]
//! Fixed-point step/velocity/acceleration types and wraparound-safe tick
//! time shared by every crate in the motion core.
//!
//! `BITS` on [`StepFixed`]/[`SignedStepFixed`] never exceeds 32 for any axis
//! configuration in this firmware (13-22 bits is typical). Each selects the
//! smallest integer that actually fits `BITS` — `u8`/`u16`/`u32` for
//! `StepFixed`, `i8`/`i16`/`i32` for `SignedStepFixed` — through an internal
//! `Backing`/`SignedBacking` trait rather than always paying for the widest
//! storage regardless of width.

mod clock;
mod fixed;
pub mod step;
mod time;

pub use clock::{Clock, TimedEvent};
pub use fixed::{AccelFixed, Fixed1616, VelFixed};
pub use step::{SignedStepFixed, StepFixed};
pub use time::TimeType;
