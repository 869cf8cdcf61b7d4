//! 16.16 fixed-point number, used for `VelFixed`/`AccelFixed` and the heater
//! PID loop. Ported from the firmware's `Fixed16_16` with a saturating
//! rather than panicking arithmetic surface, since a saturated velocity or
//! duty cycle is a recoverable control-loop event, not a programming error.

use core::ops::{Add, Div, Mul, Neg, Sub};

const FRAC_BITS: i32 = 16;
const SCALE: i64 = 1 << FRAC_BITS;

/// A 16.16 fixed-point number backed by an `i32`.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Fixed1616(i32);

impl Fixed1616 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE as i32);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub fn from_f32(f: f32) -> Self {
        Self((f * SCALE as f32) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / SCALE as f32
    }

    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub const fn saturating_mul(self, rhs: Self) -> Self {
        let wide = (self.0 as i64) * (rhs.0 as i64);
        let shifted = wide >> FRAC_BITS;
        if shifted > i32::MAX as i64 {
            Self(i32::MAX)
        } else if shifted < i32::MIN as i64 {
            Self(i32::MIN)
        } else {
            Self(shifted as i32)
        }
    }

    /// Divides, returning `i32::MAX` (saturated) rather than panicking when
    /// `rhs` is zero — a zero-duration segment must never halt a control loop.
    pub fn saturating_div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self(i32::MAX);
        }
        let wide = (self.0 as i64) << FRAC_BITS;
        let result = wide / rhs.0 as i64;
        Self(result.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    pub const fn clamp(self, lo: Self, hi: Self) -> Self {
        if self.0 < lo.0 {
            lo
        } else if self.0 > hi.0 {
            hi
        } else {
            self
        }
    }
}

impl Add for Fixed1616 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub for Fixed1616 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl Mul for Fixed1616 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.saturating_mul(rhs)
    }
}

impl Div for Fixed1616 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        self.saturating_div(rhs)
    }
}

impl Neg for Fixed1616 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(self.0.saturating_neg())
    }
}

/// Fixed-point axis velocity, in steps per tick.
pub type VelFixed = Fixed1616;
/// Fixed-point axis acceleration, in steps per tick squared.
pub type AccelFixed = Fixed1616;
