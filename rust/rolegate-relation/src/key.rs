use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::ops::RangeInclusive;

const LOW_MASK: u64 = 0xFFFF_FFFF;

/// Two 32-bit identifiers packed into one sortable 64-bit key.
///
/// The first identifier occupies the high 32 bits and the second the low 32
/// bits, so numeric key order groups every key sharing a first identifier
/// into one contiguous run.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(u64);

impl CompositeKey {
    /// Packs `high` and `low` into a key.
    pub const fn new(high: u32, low: u32) -> Self {
        Self(((high as u64) << 32) | low as u64)
    }

    /// The identifier stored in the high 32 bits.
    pub const fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The identifier stored in the low 32 bits.
    pub const fn low(self) -> u32 {
        (self.0 & LOW_MASK) as u32
    }

    /// The key with both identifiers exchanged, i.e. the key of the same
    /// pair in the opposite index.
    pub const fn swapped(self) -> Self {
        Self::new(self.low(), self.high())
    }

    /// Both identifiers, high first.
    pub const fn unpack(self) -> (u32, u32) {
        (self.high(), self.low())
    }

    /// The raw packed value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Every key whose high identifier is `high`.
    ///
    /// Equivalent to the half-open range `[high << 32, (high + 1) << 32)`,
    /// expressed inclusively so that `high == u32::MAX` does not overflow.
    pub const fn span(high: u32) -> RangeInclusive<CompositeKey> {
        Self::new(high, 0)..=Self::new(high, u32::MAX)
    }
}

impl From<u64> for CompositeKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CompositeKey> for u64 {
    fn from(key: CompositeKey) -> Self {
        key.0
    }
}

impl From<(u32, u32)> for CompositeKey {
    fn from((high, low): (u32, u32)) -> Self {
        Self::new(high, low)
    }
}

impl Debug for CompositeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompositeKey({}, {})", self.high(), self.low())
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {})", self.0, self.high(), self.low())
    }
}
