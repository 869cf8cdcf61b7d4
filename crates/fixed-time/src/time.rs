//! Wraparound-safe tick time.

/// A monotonic tick counter that wraps modulo 2^32.
///
/// Two `TimeType` values are only meaningfully comparable over a horizon
/// short enough that the true difference fits in an `i32` — the same
/// assumption every wrapping hardware timer makes. Use [`TimeType::is_before`]
/// rather than `<` so a wrapped counter still orders correctly.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct TimeType(pub u32);

impl TimeType {
    pub const ZERO: Self = Self(0);

    pub const fn wrapping_add(self, ticks: u32) -> Self {
        Self(self.0.wrapping_add(ticks))
    }

    pub const fn wrapping_sub(self, other: Self) -> u32 {
        self.0.wrapping_sub(other.0)
    }

    /// True if `self` occurred strictly before `other`, treating the
    /// difference as signed over the wraparound horizon.
    pub const fn is_before(self, other: Self) -> bool {
        (other.0.wrapping_sub(self.0) as i32) > 0
    }

    /// True if `self` is at or after `other`.
    pub const fn is_at_or_after(self, other: Self) -> bool {
        !self.is_before(other)
    }
}

impl core::ops::Add<u32> for TimeType {
    type Output = Self;
    fn add(self, rhs: u32) -> Self::Output {
        self.wrapping_add(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_before_handles_wraparound() {
        let near_wrap = TimeType(u32::MAX - 2);
        let wrapped = near_wrap.wrapping_add(5);
        assert!(near_wrap.is_before(wrapped));
        assert!(!wrapped.is_before(near_wrap));
    }

    #[test]
    fn equal_times_are_not_before_each_other() {
        let t = TimeType(42);
        assert!(!t.is_before(t));
        assert!(t.is_at_or_after(t));
    }
}
