use core::cmp::Ordering;

use crate::render::ContractViolation;

/// Ordering key for render commands.
///
/// Lower values are drawn first. Zero is the neutral layer: commands keyed `0` are drawn
/// in submission order, everything else is sorted around them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ZIndex(pub i32);

/// Which render queue bucket an ordering key lands in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ZBucket {
    Negative,
    Zero,
    Positive,
}

impl ZIndex {
    pub const ZERO: ZIndex = ZIndex(0);

    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }

    /// Converts a floating point depth (as produced by scene graphs that track a global
    /// z order in `f32`) into an ordering key.
    ///
    /// NaN, infinities, fractional values and values outside `i32` are rejected.
    pub fn from_depth(depth: f32) -> Result<Self, ContractViolation> {
        // `i32::MAX as f32` rounds up to 2^31, which is itself out of range.
        let in_range = depth >= i32::MIN as f32 && depth < i32::MAX as f32;
        if !depth.is_finite() || depth.fract() != 0.0 || !in_range {
            return Err(ContractViolation::InvalidOrderingKey(depth));
        }
        Ok(Self(depth as i32))
    }

    #[inline]
    pub const fn bucket(self) -> ZBucket {
        match self.0 {
            i32::MIN..=-1 => ZBucket::Negative,
            0 => ZBucket::Zero,
            _ => ZBucket::Positive,
        }
    }
}

impl From<i32> for ZIndex {
    #[inline]
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl Ord for ZIndex {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ZIndex {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_follows_sign() {
        assert_eq!(ZIndex(-7).bucket(), ZBucket::Negative);
        assert_eq!(ZIndex(i32::MIN).bucket(), ZBucket::Negative);
        assert_eq!(ZIndex(0).bucket(), ZBucket::Zero);
        assert_eq!(ZIndex(1).bucket(), ZBucket::Positive);
        assert_eq!(ZIndex(i32::MAX).bucket(), ZBucket::Positive);
    }

    #[test]
    fn from_depth_accepts_integral_values() {
        assert_eq!(ZIndex::from_depth(-3.0), Ok(ZIndex(-3)));
        assert_eq!(ZIndex::from_depth(0.0), Ok(ZIndex::ZERO));
        assert_eq!(ZIndex::from_depth(-0.0), Ok(ZIndex::ZERO));
        assert_eq!(ZIndex::from_depth(1024.0), Ok(ZIndex(1024)));
    }

    #[test]
    fn from_depth_rejects_nan_and_infinity() {
        assert!(ZIndex::from_depth(f32::NAN).is_err());
        assert!(ZIndex::from_depth(f32::INFINITY).is_err());
        assert!(ZIndex::from_depth(f32::NEG_INFINITY).is_err());
    }

    #[test]
    fn from_depth_rejects_fractional_and_out_of_range() {
        assert!(ZIndex::from_depth(0.5).is_err());
        assert!(ZIndex::from_depth(3.0e9).is_err());
        assert!(ZIndex::from_depth(-3.0e9).is_err());
    }
}
