//! Step-count fixed-point types.
//!
//! `StepFixed<BITS>` bounds a step count to the width an axis was configured
//! with (typically 13-22 bits on real hardware, chosen so a single stepper
//! command's step count fits the interrupt-side accumulator). The backing
//! storage is the smallest unsigned integer that actually fits `BITS`
//! (`u8`/`u16`/`u32`), selected through the internal `Backing` trait below
//! rather than always paying for a `u32` regardless of width. `SignedFixed`
//! mirrors this with `i8`/`i16`/`i32` through `SignedBacking`.
//!
//! Width selection happens once per concrete `BITS` value, via `impl`s the
//! `seq!` blocks below generate over `ConstBits<BITS>` — stable Rust has no
//! way to express "whichever of these types is smallest" as a single bounded
//! impl, so every width in range gets its own.

use seq_macro::seq;

/// Carries a bit width at the type level so `Backing`/`SignedBacking` can be
/// implemented once per concrete `BITS` instead of needing `const` generic
/// expressions in trait bounds, which stable Rust doesn't support.
pub struct ConstBits<const BITS: u32>;

/// A primitive unsigned integer usable as `StepFixed`'s backing storage.
pub trait UnsignedStorage: Copy + Clone + Default + PartialEq + Eq + PartialOrd + Ord + core::fmt::Debug + core::hash::Hash {
    fn from_u32(value: u32) -> Self;
    fn to_u32(self) -> u32;
}

/// A primitive signed integer usable as `SignedStepFixed`'s backing storage.
pub trait SignedStorage: Copy + Clone + Default + PartialEq + Eq + PartialOrd + Ord + core::fmt::Debug + core::hash::Hash {
    fn from_i32(value: i32) -> Self;
    fn to_i32(self) -> i32;
}

macro_rules! impl_unsigned_storage {
    ($($t:ty),*) => {
        $(
            impl UnsignedStorage for $t {
                fn from_u32(value: u32) -> Self {
                    value as $t
                }
                fn to_u32(self) -> u32 {
                    self as u32
                }
            }
        )*
    };
}
impl_unsigned_storage!(u8, u16, u32);

macro_rules! impl_signed_storage {
    ($($t:ty),*) => {
        $(
            impl SignedStorage for $t {
                fn from_i32(value: i32) -> Self {
                    value as $t
                }
                fn to_i32(self) -> i32 {
                    self as i32
                }
            }
        )*
    };
}
impl_signed_storage!(i8, i16, i32);

/// Maps a bit width to the smallest `UnsignedStorage` that holds it.
pub trait Backing {
    type Storage: UnsignedStorage;
}

/// Maps a bit width to the smallest `SignedStorage` whose magnitude range
/// covers it (a `BITS`-bit magnitude needs one more bit for the sign, so the
/// crossover points sit one bit below `Backing`'s).
pub trait SignedBacking {
    type Storage: SignedStorage;
}

seq!(N in 1..9 {
    impl Backing for ConstBits<N> {
        type Storage = u8;
    }
});
seq!(N in 9..17 {
    impl Backing for ConstBits<N> {
        type Storage = u16;
    }
});
seq!(N in 17..33 {
    impl Backing for ConstBits<N> {
        type Storage = u32;
    }
});

seq!(N in 1..8 {
    impl SignedBacking for ConstBits<N> {
        type Storage = i8;
    }
});
seq!(N in 8..16 {
    impl SignedBacking for ConstBits<N> {
        type Storage = i16;
    }
});
seq!(N in 16..33 {
    impl SignedBacking for ConstBits<N> {
        type Storage = i32;
    }
});

/// An unsigned step count bounded to `BITS` bits.
///
/// `BITS` must be in `1..=32`. Values are never allowed to exceed
/// `StepFixed::<BITS>::max()`; constructors saturate or reject rather than
/// wrap, since a silently wrapped step count would corrupt a planned move.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct StepFixed<const BITS: u32>(<ConstBits<BITS> as Backing>::Storage)
where
    ConstBits<BITS>: Backing;

impl<const BITS: u32> StepFixed<BITS>
where
    ConstBits<BITS>: Backing,
{
    const MASK: u32 = if BITS >= 32 { u32::MAX } else { (1u32 << BITS) - 1 };

    /// The zero value. An associated function rather than a `const` item
    /// since narrowing into the width-selected backing storage goes through
    /// `UnsignedStorage`, a regular (non-`const`) trait.
    pub fn zero() -> Self {
        Self(<ConstBits<BITS> as Backing>::Storage::from_u32(0))
    }

    /// The largest representable value for this width.
    pub fn max() -> Self {
        Self(<ConstBits<BITS> as Backing>::Storage::from_u32(Self::MASK))
    }

    /// Builds a `StepFixed`, saturating to `max()` on overflow.
    pub fn saturating_from(value: u32) -> Self {
        let clamped = if value > Self::MASK { Self::MASK } else { value };
        Self(<ConstBits<BITS> as Backing>::Storage::from_u32(clamped))
    }

    /// Builds a `StepFixed`, returning `None` if `value` does not fit.
    pub fn checked_from(value: u32) -> Option<Self> {
        if value > Self::MASK {
            None
        } else {
            Some(Self(<ConstBits<BITS> as Backing>::Storage::from_u32(value)))
        }
    }

    pub fn get(self) -> u32 {
        self.0.to_u32()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.get().checked_add(rhs.get()) {
            Some(sum) if sum <= Self::MASK => Some(Self::saturating_from(sum)),
            _ => None,
        }
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self::saturating_from(self.get().saturating_add(rhs.get()))
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.get().checked_sub(rhs.get()).map(Self::saturating_from)
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self::saturating_from(self.get().saturating_sub(rhs.get()))
    }
}

impl<const BITS: u32> From<StepFixed<BITS>> for u32
where
    ConstBits<BITS>: Backing,
{
    fn from(value: StepFixed<BITS>) -> Self {
        value.get()
    }
}

/// A signed acceleration/step parameter bounded in magnitude to `BITS` bits.
///
/// Used for the stepper command's `a` field, whose magnitude must never
/// exceed the command's step count `x` (see the axis stepper driver).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct SignedStepFixed<const BITS: u32>(<ConstBits<BITS> as SignedBacking>::Storage)
where
    ConstBits<BITS>: SignedBacking;

impl<const BITS: u32> SignedStepFixed<BITS>
where
    ConstBits<BITS>: SignedBacking,
{
    const MAGNITUDE_MASK: i32 = if BITS >= 31 { i32::MAX } else { (1i32 << BITS) - 1 };

    /// The zero value; see `StepFixed::zero` for why this isn't a `const`.
    pub fn zero() -> Self {
        Self(<ConstBits<BITS> as SignedBacking>::Storage::from_i32(0))
    }

    pub fn max_magnitude() -> i32 {
        Self::MAGNITUDE_MASK
    }

    /// Builds a signed step parameter, saturating to `±max_magnitude()`.
    pub fn saturating_from(value: i32) -> Self {
        let clamped = if value > Self::MAGNITUDE_MASK {
            Self::MAGNITUDE_MASK
        } else if value < -Self::MAGNITUDE_MASK {
            -Self::MAGNITUDE_MASK
        } else {
            value
        };
        Self(<ConstBits<BITS> as SignedBacking>::Storage::from_i32(clamped))
    }

    pub fn get(self) -> i32 {
        self.0.to_i32()
    }

    pub fn abs(self) -> u32 {
        self.get().unsigned_abs()
    }

    pub fn is_negative(self) -> bool {
        self.get() < 0
    }

    /// Clamps `self` so `|self| <= limit`, preserving sign.
    pub fn clamp_magnitude(self, limit: u32) -> Self {
        let limit = if limit > Self::MAGNITUDE_MASK as u32 {
            Self::MAGNITUDE_MASK as u32
        } else {
            limit
        };
        let value = self.get();
        if value >= 0 {
            Self::saturating_from(value.min(limit as i32))
        } else {
            Self::saturating_from((-(limit as i32)).max(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_is_all_ones_for_width() {
        assert_eq!(StepFixed::<13>::max().get(), 0x1FFF);
        assert_eq!(StepFixed::<22>::max().get(), 0x3F_FFFF);
    }

    #[test]
    fn saturating_add_clamps_at_max() {
        let a = StepFixed::<13>::saturating_from(8000);
        let b = StepFixed::<13>::saturating_from(8000);
        assert_eq!(a.saturating_add(b), StepFixed::<13>::max());
    }

    #[test]
    fn checked_from_rejects_overflow() {
        assert!(StepFixed::<13>::checked_from(8192).is_none());
        assert!(StepFixed::<13>::checked_from(8191).is_some());
    }

    #[test]
    fn signed_clamp_preserves_sign() {
        let neg = SignedStepFixed::<13>::saturating_from(-9000);
        assert!(neg.is_negative());
        assert_eq!(neg.abs(), SignedStepFixed::<13>::max_magnitude() as u32);

        let clamped = SignedStepFixed::<13>::saturating_from(-500).clamp_magnitude(100);
        assert_eq!(clamped.get(), -100);
    }

    #[test]
    fn narrow_widths_select_the_smallest_backing_type() {
        // BITS=5 fits in a u8; BITS=12 needs a u16; BITS=20 needs a u32.
        // There's no public way to name the backing type directly, so this
        // exercises the boundary values each width's storage must hold.
        assert_eq!(StepFixed::<5>::max().get(), 0x1F);
        assert_eq!(StepFixed::<12>::max().get(), 0xFFF);
        assert_eq!(StepFixed::<20>::max().get(), 0xF_FFFF);
        assert_eq!(StepFixed::<5>::saturating_from(1000).get(), 0x1F);
    }

    #[test]
    fn signed_narrow_widths_saturate_at_the_right_magnitude() {
        // BITS=6 needs an i8 (magnitude up to 63); BITS=10 needs an i16.
        assert_eq!(SignedStepFixed::<6>::max_magnitude(), 63);
        assert_eq!(SignedStepFixed::<6>::saturating_from(100).get(), 63);
        assert_eq!(SignedStepFixed::<10>::max_magnitude(), 1023);
    }
}
