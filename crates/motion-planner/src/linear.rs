//! Linear planner (§4.4): the forward/backward velocity pass over a window
//! of already-constructed segments.
//!
//! Three caps bound each segment's entry velocity: its own `max_v2`, the
//! junction limit with its predecessor, and how fast it's reachable by
//! accelerating from the previous segment's entry (`prev.v_start2 +
//! prev.a_x`) or decelerating from the next segment's entry (`next.v_start2
//! + a_x`). A backward pass applies the deceleration constraint tail to
//! head, a forward pass applies the acceleration constraint head to tail;
//! together they converge to the fastest profile that never asks a segment
//! to brake or accelerate faster than its axes allow. The first segment's
//! entry velocity is not a cap to relax — it is already committed (the
//! stepper is moving at that speed right now) and is pinned before and
//! after both passes.
//!
//! Once entry/exit velocities are fixed, each segment's cruise peak is
//! either `max_v2` (a full trapezoid: accelerate, cruise, decelerate) or,
//! when there isn't enough distance to reach `max_v2`, the apex of a
//! triangular profile: `v_peak^2 = (v_start^2 + v_end^2 + a_x) / 2`, the
//! point where the accel-limited and decel-limited halves of the move meet.

use crate::types::LpSeg;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SegmentVelocity {
    pub v_start2: f32,
    pub v_end2: f32,
    pub v_peak2: f32,
}

/// Runs the lookahead velocity pass over `lp[0..n]`, writing results into
/// `out[0..n]` (`out.len()` must equal `lp.len()`).
///
/// `start_v2` is the already-committed entry velocity of `lp[0]` (0 if the
/// axes are at rest). `ends_at_rest` should be `true` only when `lp`'s last
/// entry is genuinely the final buffered segment with nothing queued behind
/// it — the common case, a partially filled lookahead window, assumes the
/// tail segment could still be extended and leaves its exit unconstrained
/// at its own `max_v2` until a following segment arrives to constrain it.
pub fn plan_velocities(lp: &[LpSeg], start_v2: f32, ends_at_rest: bool, out: &mut [SegmentVelocity]) {
    let n = lp.len();
    assert_eq!(n, out.len());
    if n == 0 {
        return;
    }

    for i in 0..n {
        out[i].v_start2 = if i == 0 {
            start_v2
        } else {
            lp[i].max_v2.min(lp[i].junction_max_start_v2)
        };
    }

    // Backward (deceleration-limited) pass.
    let mut exit_cap = if ends_at_rest { 0.0 } else { lp[n - 1].max_v2 };
    for i in (0..n).rev() {
        out[i].v_start2 = out[i].v_start2.min(exit_cap + lp[i].a_x);
        exit_cap = out[i].v_start2;
    }
    out[0].v_start2 = start_v2;

    // Forward (acceleration-limited) pass.
    for i in 1..n {
        out[i].v_start2 = out[i].v_start2.min(out[i - 1].v_start2 + lp[i - 1].a_x);
    }
    out[0].v_start2 = start_v2;

    for i in 0..n {
        out[i].v_end2 = if i + 1 < n {
            out[i + 1].v_start2
        } else if ends_at_rest {
            0.0
        } else {
            lp[i].max_v2
        };
    }

    for i in 0..n {
        let triangular_peak = (out[i].v_start2 + out[i].v_end2 + lp[i].a_x) / 2.0;
        out[i].v_peak2 = triangular_peak.min(lp[i].max_v2).max(out[i].v_start2.max(out[i].v_end2));
    }
}
