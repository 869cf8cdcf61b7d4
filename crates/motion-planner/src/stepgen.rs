//! Stepper command generation: turns one segment's `(v_start, v_peak,
//! v_end)` into up to three [`axis_stepper::StepperCommand`]s per axis —
//! accelerate, cruise, decelerate — each independently primeable by
//! [`axis_stepper::timing::StepTiming::prime`].
//!
//! The three phases are computed once in scalar (distance, time) space from
//! the segment's own acceleration, then every axis's step count and
//! acceleration parameter are derived from its share of that same distance
//! split — a straight-line move keeps every axis's position a fixed linear
//! function of the overall arc length, so the split that holds for the
//! scalar move holds per axis too.

use fixed_time::step::{Backing, ConstBits, SignedBacking};
use fixed_time::{SignedStepFixed, StepFixed, TimeType};

use crate::linear::SegmentVelocity;

fn safe_div(num: f32, den: f32) -> f32 {
    if den.abs() < 1e-9 {
        0.0
    } else {
        num / den
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhasePlan {
    /// Ticks spent accelerating, cruising, decelerating.
    pub ticks: [u32; 3],
    /// Fraction of the segment's total distance covered by each phase;
    /// sums to 1.0 (a phase with zero duration also has zero fraction).
    pub distance_fraction: [f32; 3],
    /// Scalar speed at the start and end of each phase, used to derive
    /// each axis's signed acceleration parameter.
    pub phase_speed: [(f32, f32); 3],
}

/// Splits a segment's `distance` into accel/cruise/decel phases given its
/// planned entry/peak/exit velocities and its own max acceleration.
pub fn phase_plan(distance: f32, vel: SegmentVelocity, max_accel: f32, ticks_per_second: f32) -> PhasePlan {
    let v_start = vel.v_start2.max(0.0).sqrt();
    let v_peak = vel.v_peak2.max(0.0).sqrt();
    let v_end = vel.v_end2.max(0.0).sqrt();
    let accel = max_accel.max(1e-6);

    let t0 = safe_div((v_peak - v_start).max(0.0), accel);
    let t2 = safe_div((v_peak - v_end).max(0.0), accel);
    let d0 = 0.5 * (v_start + v_peak) * t0;
    let d2 = 0.5 * (v_peak + v_end) * t2;
    let d1 = (distance - d0 - d2).max(0.0);
    let t1 = safe_div(d1, v_peak);

    let (frac0, frac2) = if distance > 0.0 {
        ((d0 / distance).clamp(0.0, 1.0), (d2 / distance).clamp(0.0, 1.0))
    } else {
        (0.0, 0.0)
    };
    let frac1 = (1.0 - frac0 - frac2).max(0.0);

    PhasePlan {
        ticks: [
            (t0 * ticks_per_second).round().max(0.0) as u32,
            (t1 * ticks_per_second).round().max(0.0) as u32,
            (t2 * ticks_per_second).round().max(0.0) as u32,
        ],
        distance_fraction: [frac0, frac1, frac2],
        phase_speed: [(v_start, v_peak), (v_peak, v_peak), (v_peak, v_end)],
    }
}

/// Signed acceleration parameter for one phase: positive shrinks per-step
/// intervals (speeding up), negative grows them (slowing down), magnitude
/// bounded by `x` per `StepTiming`'s contract.
fn phase_accel<const BITS: u32>(x: u32, entry: f32, exit: f32) -> SignedStepFixed<BITS>
where
    ConstBits<BITS>: SignedBacking,
{
    if x == 0 {
        return SignedStepFixed::zero();
    }
    let denom = entry + exit;
    let ratio = if denom.abs() < 1e-9 { 0.0 } else { 2.0 * (exit - entry) / denom };
    let a = (x as f32 * ratio).round() as i32;
    SignedStepFixed::saturating_from(a)
}

/// Splits one axis's total step count across the three phases using the
/// same cumulative-floor technique `split` uses for chunking: each phase
/// boundary is the floor of the running distance fraction, so the three
/// counts always sum back to `total` and any rounding remainder lands in
/// the cruise phase, whose constant velocity tolerates it without any
/// ramp-shape distortion.
fn split_axis_steps(total: u32, distance_fraction: [f32; 3]) -> [u32; 3] {
    let x0 = (total as f32 * distance_fraction[0]).round() as u32;
    let x2 = (total as f32 * distance_fraction[2]).round() as u32;
    let x0 = x0.min(total);
    let x2 = x2.min(total - x0);
    let x1 = total - x0 - x2;
    [x0, x1, x2]
}

/// Generates this axis's up-to-three stepper commands for the segment.
/// Phases with zero steps are omitted entirely (the axis's own ISR queue
/// simply never sees them).
pub fn axis_phase_commands<const BITS: u32>(
    dir: bool,
    delta: StepFixed<BITS>,
    plan: &PhasePlan,
) -> heapless::Vec<axis_stepper::StepperCommand<BITS>, 3>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    let mut out = heapless::Vec::new();
    let counts = split_axis_steps(delta.get(), plan.distance_fraction);
    for phase in 0..3 {
        let x = counts[phase];
        if x == 0 {
            continue;
        }
        let (entry, exit) = plan.phase_speed[phase];
        let cmd = axis_stepper::StepperCommand::new(
            dir,
            StepFixed::saturating_from(x),
            TimeType(plan.ticks[phase]),
            phase_accel::<BITS>(x, entry, exit),
        );
        // heapless::Vec<_, 3> with at most 3 phases never overflows.
        let _ = out.push(cmd);
    }
    out
}
