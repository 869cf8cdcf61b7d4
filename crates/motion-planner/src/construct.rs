//! Segment construction (§4.3): turns one already-split chunk into a
//! `Segment` carrying the precomputed `LpSeg` record the linear planner
//! needs, without re-deriving any of it on the hot planning pass.
//!
//! `LpSeg` bundles, for one axis move:
//! - `max_v2`   — the square of the move's own speed ceiling (user request
//!   folded together with every axis's `max_speed_rec`).
//! - `a_x`      — `2 * max_accel * distance`, the squared-velocity gain
//!   available over the whole move at max acceleration.
//! - `two_max_v_minus_a_x` — precomputed so the linear pass's
//!   triangular-vs-trapezoidal test is a single comparison.
//! - `junction_max_start_v2` — the entry velocity ceiling imposed by the
//!   corner with the previous segment. For each axis, `m_i = x_i / L` is
//!   that axis's share of the move's own length; `dm_i` is how much that
//!   share changes across the corner (`m_i + prev_m_i` if the axis reverses
//!   direction, `|m_i - prev_m_i|` otherwise). The allowed junction speed is
//!   `1 / max_i(dm_i * corneringSpeedComputationFactor_i)` — the axis whose
//!   share changes the most, scaled by how touchy its cornering factor is,
//!   sets the limit for every axis.

use fixed_time::step::{Backing, ConstBits};
use fixed_time::StepFixed;

use crate::types::{AxisConfig, LpSeg, Segment, SegmentKind};

fn safe_div(num: f32, den: f32) -> f32 {
    if den.abs() < 1e-9 {
        0.0
    } else {
        num / den
    }
}

fn axis_unit_vector<const BITS: u32, const AXES: usize>(
    dir: &[bool; AXES],
    delta: &[StepFixed<BITS>; AXES],
    axes: &[AxisConfig; AXES],
) -> ([f32; AXES], f32)
where
    ConstBits<BITS>: Backing,
{
    let mut scaled = [0.0f32; AXES];
    for i in 0..AXES {
        let signed = if dir[i] { 1.0 } else { -1.0 };
        scaled[i] = signed * (delta[i].get() as f32) * axes[i].distance_factor;
    }
    let distance = scaled.iter().map(|v| v * v).sum::<f32>().sqrt();
    let mut unit = [0.0f32; AXES];
    if distance > 0.0 {
        for i in 0..AXES {
            unit[i] = scaled[i] / distance;
        }
    }
    (unit, distance)
}

/// Builds the `LpSeg` for one axis-move chunk. `prev` is the segment
/// currently at the tail of the ring, consulted only for the junction
/// velocity limit; a `None` (move starts after a stop, or the ring was
/// empty) yields an unconstrained junction, i.e. the move may start from
/// rest up to its own `max_v2`.
pub fn construct_axis_segment<const BITS: u32, const AXES: usize>(
    dir: [bool; AXES],
    delta: [StepFixed<BITS>; AXES],
    rel_max_v_rec: f32,
    axes: &[AxisConfig; AXES],
    prev: Option<&Segment<BITS, AXES>>,
) -> Segment<BITS, AXES>
where
    ConstBits<BITS>: Backing,
{
    let (unit, distance) = axis_unit_vector(&dir, &delta, axes);

    let mut rel_speed_rec = rel_max_v_rec;
    let mut rel_accel_rec = 0.0f32;
    for i in 0..AXES {
        if distance > 0.0 {
            let frac = unit[i].abs();
            rel_speed_rec = rel_speed_rec.max(frac * axes[i].max_speed_rec);
            rel_accel_rec = rel_accel_rec.max(frac * axes[i].max_accel_rec);
        }
    }

    let max_v = safe_div(1.0, rel_speed_rec);
    let max_v2 = max_v * max_v;
    let max_accel = safe_div(1.0, rel_accel_rec);
    let a_x = 2.0 * max_accel * distance;
    let two_max_v_minus_a_x = 2.0 * max_v - a_x;

    let junction_max_start_v2 = match prev {
        None => f32::INFINITY,
        Some(prev_seg) => match &prev_seg.kind {
            SegmentKind::Channel { .. } => f32::INFINITY,
            SegmentKind::AxisMove { dir: pdir, delta: pdelta, distance: prev_distance, .. } => {
                if distance <= 0.0 || *prev_distance <= 0.0 {
                    f32::INFINITY
                } else {
                    let (prev_unit, _) = axis_unit_vector(pdir, pdelta, axes);
                    let mut max_dm_factor = 0.0f32;
                    for i in 0..AXES {
                        let m_i = unit[i].abs();
                        let prev_m_i = prev_unit[i].abs();
                        let dm_i = if dir[i] != pdir[i] { m_i + prev_m_i } else { (m_i - prev_m_i).abs() };
                        max_dm_factor = max_dm_factor.max(dm_i * axes[i].cornering_speed_computation_factor);
                    }
                    if max_dm_factor < 1e-9 {
                        f32::INFINITY
                    } else {
                        let junction_start_v = 1.0 / max_dm_factor;
                        junction_start_v * junction_start_v
                    }
                }
            }
        },
    };

    Segment {
        kind: SegmentKind::AxisMove {
            dir,
            delta,
            distance,
            lp: LpSeg {
                max_v2,
                a_x,
                two_max_v_minus_a_x,
                rel_max_speed_rec: rel_speed_rec,
                max_accel_rec: rel_accel_rec,
                junction_max_start_v2,
            },
        },
    }
}
