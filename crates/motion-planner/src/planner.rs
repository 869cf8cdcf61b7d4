//! Orchestration: the segment ring, the buffering/stepping/aborted state
//! machine, and `plan()`, the pass that turns buffered segments into
//! stepper commands.
//!
//! Each `plan()` call re-runs the linear planner's velocity pass over
//! *every* segment still sitting in the ring — a segment's planned speed
//! can still shift right up until it's actually committed, since a newly
//! arrived segment behind it might impose a tighter junction limit or, for
//! the ring's tail, relax the "ends at rest" assumption. The leading
//! `commit_count` segments are turned into **commit**-region commands and
//! evicted; everything past that stays in the ring but still gets
//! **backup**-region commands emitted for it this pass, since a caller
//! wiring up per-axis rings ahead of time wants a preview of the
//! replannable tail even though it will be regenerated (and the backup
//! commands discarded) on the next pass. On a short pass (fewer segments
//! available than `commit_count`, typically because the pull handler
//! briefly has nothing queued) `last_max_v` is left untouched rather than
//! reset, so the next pass's junction computation for the ring's new head
//! still sees the speed from the last *full* commit, not the short one.
//! See `DESIGN.md`.
//!
//! Publishing a commit is gated on `syncing`: while STEPPING, the ISR is
//! assumed to be draining the commit region the previous pass published,
//! and a commit may only advance that region while the ISR is still
//! caught up with it. Callers report an ISR underrun via
//! [`MotionPlanner::report_underrun`] (safe to call from interrupt
//! context); the next `plan()` call then recovers to BUFFERING instead of
//! publishing, via [`MotionPlanner::recover_from_underrun`], and
//! `PlanOutput::underrun` is set so the caller can react (the polled
//! equivalent of an `UnderrunCallback`, matching this crate's existing
//! poll-based `PullHandler`/`finished` style rather than a second generic
//! callback parameter on `MotionPlanner`).

use heapless::Deque;
use fixed_time::step::{Backing, ConstBits, SignedBacking};
use fixed_time::TimeType;

use crate::construct::construct_axis_segment;
use crate::error::PlannerError;
use crate::linear::{plan_velocities, SegmentVelocity};
use crate::split::SplitState;
use crate::stepgen::{axis_phase_commands, phase_plan};
use crate::types::{
    ChannelPayload, CommitRegion, PlannedAxisCommand, PlannedChannelCommand, PlannerConfig, PullHandler,
    PullResponse, Segment, SegmentKind,
};

pub const LOOKAHEAD: usize = 8;
const MIN_COMMIT_HEADROOM: usize = 6;
/// Upper bound on stepper commands one `plan()` pass can emit: every
/// committed segment contributes at most 3 phases per axis.
const MAX_PLAN_AXIS_COMMANDS: usize = LOOKAHEAD * 3 * 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlannerState {
    Buffering,
    Stepping,
    Aborted,
}

/// Output of one `plan()` pass: commands ready to hand to each axis's
/// `axis_stepper::AxisStepperEngine` queue, plus any channel commands due.
#[derive(Default)]
pub struct PlanOutput<const BITS: u32, const AXES: usize>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub axis_commands: heapless::Vec<PlannedAxisCommand<BITS>, MAX_PLAN_AXIS_COMMANDS>,
    pub channel_commands: heapless::Vec<PlannedChannelCommand, LOOKAHEAD>,
    pub finished: bool,
    /// Set when this pass recovered from an ISR underrun instead of
    /// publishing a commit — no commands were produced and the ring was
    /// left untouched for the next pass to replan.
    pub underrun: bool,
}

pub struct MotionPlanner<const BITS: u32, const AXES: usize, H>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    config: PlannerConfig<AXES>,
    ring: Deque<Segment<BITS, AXES>, LOOKAHEAD>,
    pull: H,
    split: Option<SplitState<AXES>>,
    source_finished: bool,
    state: PlannerState,
    last_exit_v2: f32,
    last_max_v: f32,
    /// End of the committed (executing) prefix, in absolute ticks —
    /// `m_staging_time`. Channel commands stamp their `absolute_time`
    /// relative to this plus the committed durations ahead of them.
    staging_time: TimeType,
    /// Whether the ISR is still believed to be draining the commit region
    /// published last pass (`m_syncing`). Mutated under a critical section
    /// since `report_underrun`/`mark_syncing` may be called from interrupt
    /// context in a real deployment.
    syncing: bool,
}

impl<const BITS: u32, const AXES: usize, H: PullHandler<AXES>> MotionPlanner<BITS, AXES, H>
where
    ConstBits<BITS>: Backing + SignedBacking,
{
    pub fn new(config: PlannerConfig<AXES>, pull: H) -> Result<Self, PlannerError> {
        if LOOKAHEAD < config.commit_count + MIN_COMMIT_HEADROOM {
            return Err(PlannerError::InvalidCommitCount);
        }
        Ok(Self {
            config,
            ring: Deque::new(),
            pull,
            split: None,
            source_finished: false,
            state: PlannerState::Buffering,
            last_exit_v2: 0.0,
            last_max_v: 0.0,
            staging_time: TimeType::ZERO,
            syncing: true,
        })
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn abort(&mut self) {
        self.ring.clear();
        self.split = None;
        self.state = PlannerState::Aborted;
    }

    /// Marks the ISR as caught up with the last published commit — call
    /// once the timer interrupt starts consuming it. Safe from interrupt
    /// context.
    pub fn mark_syncing(&mut self) {
        critical_section::with(|_cs| self.syncing = true);
    }

    /// Reports that the ISR drained its committed queue before the next
    /// `plan()` pass could extend it (an underrun). Call from the stepper
    /// fast-event handler when `AxisStepperEngine` goes idle with
    /// committed work still outstanding. Safe from interrupt context.
    pub fn report_underrun(&mut self) {
        critical_section::with(|_cs| self.syncing = false);
    }

    /// `STEPPING -> BUFFERING` underrun recovery. Resets the staging
    /// velocity to rest so the next plan pass starts from `v_in² = 0`
    /// exactly as if the ring had drained naturally; buffered segments are
    /// kept and replanned from scratch once buffering resumes.
    pub fn recover_from_underrun(&mut self) {
        self.last_exit_v2 = 0.0;
        self.syncing = true;
        self.state = PlannerState::Buffering;
    }

    /// Pulls raw work from the handler and chunks it into the ring until
    /// either the ring is full or the handler has nothing left to give.
    fn refill(&mut self) -> Result<(), PlannerError> {
        loop {
            if self.ring.is_full() {
                return Ok(());
            }
            if let Some(split) = &mut self.split {
                match split.next_chunk::<BITS>() {
                    Some((dir, delta, rel_max_v_rec)) => {
                        let prev = self.ring.back();
                        let seg = construct_axis_segment(dir, delta, rel_max_v_rec, &self.config.axes, prev);
                        self.ring
                            .push_back(seg)
                            .map_err(|_| PlannerError::QueueFull)?;
                        if split.is_exhausted() {
                            self.split = None;
                        }
                        continue;
                    }
                    None => {
                        self.split = None;
                        continue;
                    }
                }
            }

            match self.pull.pull() {
                PullResponse::AxesCommand(mv) => {
                    self.split = Some(SplitState::new::<BITS>(mv));
                }
                PullResponse::ChannelCommand(channel, payload) => {
                    self.ring
                        .push_back(Segment { kind: SegmentKind::Channel { channel, payload } })
                        .map_err(|_| PlannerError::QueueFull)?;
                }
                PullResponse::Empty => return Ok(()),
                PullResponse::Finished => {
                    self.source_finished = true;
                    return Ok(());
                }
            }
        }
    }

    /// Runs one plan pass: refills the ring, replans velocities over
    /// everything buffered, and attempts to publish a commit of up to
    /// `commit_count` segments' worth of stepper/channel commands, with the
    /// replannable remainder emitted as backup-region commands.
    pub fn plan(&mut self) -> Result<PlanOutput<BITS, AXES>, PlannerError> {
        if self.state == PlannerState::Aborted {
            self.state = PlannerState::Buffering;
        }

        if self.state == PlannerState::Stepping && !critical_section::with(|_cs| self.syncing) {
            self.recover_from_underrun();
            return Ok(PlanOutput { underrun: true, ..PlanOutput::default() });
        }

        self.refill()?;

        let mut lp = heapless::Vec::<_, LOOKAHEAD>::new();
        let mut ring_index_of_lp = heapless::Vec::<usize, LOOKAHEAD>::new();
        for (i, seg) in self.ring.iter().enumerate() {
            if let SegmentKind::AxisMove { lp: seg_lp, .. } = &seg.kind {
                let _ = lp.push(*seg_lp);
                let _ = ring_index_of_lp.push(i);
            }
        }

        let ends_at_rest = self.source_finished && self.split.is_none();
        let mut vel = heapless::Vec::<SegmentVelocity, LOOKAHEAD>::new();
        for _ in 0..lp.len() {
            let _ = vel.push(SegmentVelocity::default());
        }
        plan_velocities(&lp, self.last_exit_v2, ends_at_rest, &mut vel);

        let commit_count = self.config.commit_count.min(self.ring.len());
        let mut out = PlanOutput::default();
        let mut cursor_time = self.staging_time;
        let mut committed_exit_v2 = self.last_exit_v2;
        // Captured only once the loop reaches the end of the commit
        // region; these become the new staging state, but only if the
        // publish gate below actually lets the commit through.
        let mut committed_cursor_time = self.staging_time;

        for idx in 0..self.ring.len() {
            let region = if idx < commit_count { CommitRegion::Commit } else { CommitRegion::Backup };
            let seg = *self.ring.iter().nth(idx).expect("idx < ring.len()");
            match seg.kind {
                SegmentKind::AxisMove { dir, delta, distance, lp: seg_lp } => {
                    let lp_pos = ring_index_of_lp.iter().position(|&r| r == idx).expect("axis move indexed");
                    let v = vel[lp_pos];
                    let accel = if seg_lp.max_accel_rec.abs() < 1e-9 { 0.0 } else { 1.0 / seg_lp.max_accel_rec };
                    let plan = phase_plan(distance, v, accel, self.config.ticks_per_second);
                    for axis in 0..AXES {
                        if delta[axis].get() == 0 {
                            continue;
                        }
                        for cmd in axis_phase_commands::<BITS>(dir[axis], delta[axis], &plan) {
                            out.axis_commands.push(PlannedAxisCommand { axis, command: cmd, region }).map_err(|_| PlannerError::QueueFull)?;
                        }
                    }
                    cursor_time = cursor_time.wrapping_add(plan.ticks.iter().sum());
                    if region == CommitRegion::Commit {
                        committed_exit_v2 = v.v_end2;
                    }
                }
                SegmentKind::Channel { channel, payload } => {
                    out.channel_commands
                        .push(PlannedChannelCommand { channel, payload, absolute_time: cursor_time, region })
                        .map_err(|_| PlannerError::QueueFull)?;
                }
            }
            if idx + 1 == commit_count {
                // Staging state describes the end of the committed prefix
                // only; backup-region segments past this point haven't
                // actually been committed yet, and must not be folded in
                // unless the publish below actually succeeds.
                committed_cursor_time = cursor_time;
            }
        }

        // Publish: BUFFERING commits unconditionally; STEPPING may only
        // advance the commit region while the ISR is still syncing with
        // what was published last pass. The check-and-commit must be one
        // atomic step or an ISR draining the last command between the
        // check and the eviction below would silently commit past an
        // underrun.
        let publish = if self.state == PlannerState::Stepping {
            critical_section::with(|_cs| self.syncing)
        } else {
            true
        };

        if !publish {
            self.recover_from_underrun();
            return Ok(PlanOutput { underrun: true, ..PlanOutput::default() });
        }

        self.staging_time = committed_cursor_time;
        self.last_exit_v2 = committed_exit_v2;

        if commit_count == self.config.commit_count {
            self.last_max_v = self.last_exit_v2.sqrt();
        }
        // On an underrun (commit_count < configured count) `last_max_v` is
        // deliberately left stale; see the module doc comment.

        for _ in 0..commit_count {
            self.ring.pop_front();
        }

        out.finished = self.source_finished && self.split.is_none() && self.ring.is_empty();
        self.state = if out.finished {
            PlannerState::Stepping
        } else if self.ring.is_empty() && self.split.is_none() {
            PlannerState::Buffering
        } else {
            PlannerState::Stepping
        };

        Ok(out)
    }

    pub fn last_committed_max_v(&self) -> f32 {
        self.last_max_v
    }

    /// Sums axis `axis`'s unexecuted steps across everything the planner
    /// still holds but has not committed: segments sitting in the ring and
    /// any partially-consumed split remainder. Combined with the axis
    /// driver's own `AxisStepperEngine::aborted_remaining` and whatever is
    /// still queued on the per-axis stepper ring, this is the per-axis
    /// unexecuted step count reported on abort (§5 "Cancellation").
    pub fn uncommitted_steps(&self, axis: usize) -> u32 {
        let mut total = 0u32;
        for seg in self.ring.iter() {
            if let SegmentKind::AxisMove { delta, .. } = &seg.kind {
                total += delta[axis].get();
            }
        }
        if let Some(split) = &self.split {
            total += split.remaining_steps(axis);
        }
        total
    }
}

/// Queues a heater/fan payload for a future channel segment at an absolute
/// planner-relative time. `AxisMove`-only buffers never call this; it
/// exists so `heater-control` can inject a target-temperature change
/// synchronized with the move stream instead of applying it immediately.
pub fn channel_payload_for_heater(heater: u8, target_tenths_c: i16) -> ChannelPayload {
    ChannelPayload::HeaterTarget { heater, target_tenths_c }
}
