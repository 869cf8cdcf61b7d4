//! Split / chunking stage (§4.2).
//!
//! A raw move's deltas are plain step counts; a stepper command's `x` field
//! is a narrower `StepFixed<BITS>`. Before a move reaches the segment ring
//! it is cut into `split_count` chunks, each small enough that every axis's
//! chunk delta fits `StepFixed::<BITS>::max()`, with a 1.0001 safety factor
//! so rounding in the chunk count never leaves a chunk exactly at the
//! boundary. Each axis's chunks are sized by floor-dividing its cumulative
//! total by `split_count` (the same running-remainder technique a Bresenham
//! line algorithm uses), which guarantees the chunks sum back to exactly
//! the original delta regardless of how unevenly the axes split.

use fixed_time::step::{Backing, ConstBits};
use fixed_time::StepFixed;

use crate::types::RawAxisMove;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SplitState<const AXES: usize> {
    dir: [bool; AXES],
    total_delta: [u32; AXES],
    rel_max_v_rec: f32,
    split_count: u32,
    split_pos: u32,
}

impl<const AXES: usize> SplitState<AXES> {
    pub fn new<const BITS: u32>(mv: RawAxisMove<AXES>) -> Self
    where
        ConstBits<BITS>: Backing,
    {
        let max_per_chunk = StepFixed::<BITS>::max().get() as f32;
        let mut worst_ratio = 0.0f32;
        for i in 0..AXES {
            if max_per_chunk > 0.0 {
                worst_ratio = worst_ratio.max(mv.delta[i] as f32 / max_per_chunk);
            }
        }
        let split_count = ((worst_ratio * 1.0001).ceil() as u32).max(1);
        Self {
            dir: mv.dir,
            total_delta: mv.delta,
            rel_max_v_rec: mv.rel_max_v_rec,
            split_count,
            split_pos: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.split_pos >= self.split_count
    }

    pub fn split_count(&self) -> u32 {
        self.split_count
    }

    pub fn split_pos(&self) -> u32 {
        self.split_pos
    }

    /// Steps of `axis`'s total delta not yet handed out by `next_chunk` —
    /// the "unconsumed split remainder" term of the per-axis unexecuted
    /// step count reported on abort (§5 "Cancellation").
    pub fn remaining_steps(&self, axis: usize) -> u32 {
        let done = cumulative(self.total_delta[axis], self.split_pos, self.split_count);
        self.total_delta[axis] - done
    }

    /// Produces the next chunk's per-axis deltas (already bounded to
    /// `StepFixed<BITS>`) and advances `split_pos`. Returns `None` once
    /// exhausted.
    pub fn next_chunk<const BITS: u32>(&mut self) -> Option<([bool; AXES], [StepFixed<BITS>; AXES], f32)>
    where
        ConstBits<BITS>: Backing,
    {
        if self.is_exhausted() {
            return None;
        }
        let mut deltas = [StepFixed::<BITS>::zero(); AXES];
        for i in 0..AXES {
            let prev_cum = cumulative(self.total_delta[i], self.split_pos, self.split_count);
            let cum = cumulative(self.total_delta[i], self.split_pos + 1, self.split_count);
            deltas[i] = StepFixed::saturating_from(cum - prev_cum);
        }
        self.split_pos += 1;
        Some((self.dir, deltas, self.rel_max_v_rec))
    }
}

fn cumulative(total: u32, pos: u32, count: u32) -> u32 {
    ((total as u64 * pos as u64) / count as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_when_move_fits() {
        let mv = RawAxisMove::<2> { dir: [true, false], delta: [100, 50], rel_max_v_rec: 0.01 };
        let mut split = SplitState::<2>::new::<13>(mv);
        assert_eq!(split.split_count(), 1);
        let (_, deltas, _) = split.next_chunk::<13>().unwrap();
        assert_eq!(deltas[0].get(), 100);
        assert_eq!(deltas[1].get(), 50);
        assert!(split.is_exhausted());
    }

    #[test]
    fn remaining_steps_tracks_the_unconsumed_tail() {
        let mv = RawAxisMove::<1> { dir: [true], delta: [20_000], rel_max_v_rec: 0.01 };
        let mut split = SplitState::<1>::new::<13>(mv);
        assert_eq!(split.remaining_steps(0), 20_000);
        let (_, deltas, _) = split.next_chunk::<13>().unwrap();
        assert_eq!(split.remaining_steps(0), 20_000 - deltas[0].get());
        while !split.is_exhausted() {
            split.next_chunk::<13>();
        }
        assert_eq!(split.remaining_steps(0), 0);
    }

    #[test]
    fn large_move_splits_and_sums_exactly() {
        let mv = RawAxisMove::<1> { dir: [true], delta: [20_000], rel_max_v_rec: 0.01 };
        let mut split = SplitState::<1>::new::<13>(mv);
        assert!(split.split_count() >= 3);
        let mut total = 0u32;
        while let Some((_, deltas, _)) = split.next_chunk::<13>() {
            assert!(deltas[0].get() <= StepFixed::<13>::max().get());
            total += deltas[0].get();
        }
        assert_eq!(total, 20_000);
    }
}
