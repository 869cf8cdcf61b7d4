//! Data model: split-buffer input, segment ring entries, and per-axis
//! configuration. Mirrors spec §3.2–§3.3; `AXES` is the compile-time axis
//! count (a CoreXY/Cartesian printer typically instantiates this at 4: X, Y,
//! Z, E).

use fixed_time::step::{Backing, ConstBits, SignedBacking};
use fixed_time::{StepFixed, TimeType};

/// An opaque aux-channel payload (heater target, fan duty, ...). The motion
/// core does not interpret these beyond carrying them to the channel ring
/// at the right absolute time; `heater-control` decodes `HeaterTarget`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ChannelPayload {
    HeaterTarget { heater: u8, target_tenths_c: i16 },
    FanDuty { fan: u8, duty: u8 },
}

/// One axis move as requested by the external command source, before
/// chunking. Deltas here are plain step counts, not yet bounded to a
/// stepper command's narrower `StepFixed<BITS>` range — that bound is
/// enforced by the split stage (§4.2), which is the only place a move this
/// large is cut down to segment-sized pieces. `rel_max_v_rec` is the
/// reciprocal of the move's user-requested max velocity (minimum of
/// per-axis limits and any cornering ceiling the caller already knows
/// about).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawAxisMove<const AXES: usize> {
    pub dir: [bool; AXES],
    pub delta: [u32; AXES],
    pub rel_max_v_rec: f32,
}

/// What the pull handler hands back in response to a pull request (§6.3).
pub enum PullResponse<const AXES: usize> {
    AxesCommand(RawAxisMove<AXES>),
    ChannelCommand(usize, ChannelPayload),
    Empty,
    Finished,
}

/// Caller-supplied source of work, invoked whenever the split buffer is free.
pub trait PullHandler<const AXES: usize> {
    fn pull(&mut self) -> PullResponse<AXES>;
}

/// Per-axis static configuration, built once and held by value (§7
/// "Configuration").
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisConfig {
    pub max_speed_rec: f32,
    pub max_accel_rec: f32,
    pub distance_factor: f32,
    pub cornering_speed_computation_factor: f32,
    pub sync_min_step_time: f32,
    pub async_min_step_time: f32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            max_speed_rec: 0.0,
            max_accel_rec: 0.0,
            distance_factor: 1.0,
            cornering_speed_computation_factor: 1.0,
            sync_min_step_time: 0.0,
            async_min_step_time: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannerConfig<const AXES: usize> {
    pub axes: [AxisConfig; AXES],
    /// Number of segments committed to the per-axis stepper rings per
    /// successful plan pass (`LookaheadCommitCount`).
    pub commit_count: usize,
    /// Stepper ISR timer rate, used to convert the linear planner's
    /// seconds-denominated phase durations into the tick counts stepper
    /// commands are denominated in.
    pub ticks_per_second: f32,
}

/// The planner's per-segment record used by the linear planner (§3.3
/// `lp_seg`).
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct LpSeg {
    pub max_v2: f32,
    pub a_x: f32,
    pub two_max_v_minus_a_x: f32,
    pub rel_max_speed_rec: f32,
    pub max_accel_rec: f32,
    pub junction_max_start_v2: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SegmentKind<const BITS: u32, const AXES: usize>
where
    ConstBits<BITS>: Backing,
{
    AxisMove {
        dir: [bool; AXES],
        delta: [StepFixed<BITS>; AXES],
        distance: f32,
        lp: LpSeg,
    },
    Channel {
        channel: usize,
        payload: ChannelPayload,
    },
}

/// One ring entry (§3.3).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment<const BITS: u32, const AXES: usize>
where
    ConstBits<BITS>: Backing,
{
    pub kind: SegmentKind<BITS, AXES>,
}

/// Where a stepper or channel command produced by a plan pass lands
/// (§3.4, §4.5 step 3). `Commit` covers the leading `commit_count`
/// segments, published to the per-axis ring for the ISR to consume.
/// `Backup` covers everything past that: still emitted every pass so a
/// caller staging per-axis rings ahead of time has something to look at,
/// but never published — the next pass regenerates it from scratch once
/// later segments have had a chance to adjust the ring's velocities.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommitRegion {
    Commit,
    Backup,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannedAxisCommand<const BITS: u32>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub axis: usize,
    pub command: axis_stepper::StepperCommand<BITS>,
    pub region: CommitRegion,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannedChannelCommand {
    pub channel: usize,
    pub payload: ChannelPayload,
    pub absolute_time: TimeType,
    pub region: CommitRegion,
}
