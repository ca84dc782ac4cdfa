//! Exact nanosecond timestamps.
//!
//! Recorded streams carry their time as a `(sec, nanosec)` pair. The engine
//! folds that pair into a single signed nanosecond count so that equality,
//! ordering and offsets are plain integer operations. Floating point is only
//! ever used for display.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// The wire-level `(sec, nanosec)` pair found in message headers.
///
/// A `Stamp` is only as trustworthy as the codec that produced it; converting
/// it into a [`Timestamp`] validates the nanosecond field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamp {
    /// Whole seconds since the stream epoch
    pub sec: i64,
    /// Sub-second part, expected in `[0, 1_000_000_000)`
    pub nanosec: u32,
}

impl Stamp {
    /// Create a stamp without validating it.
    pub const fn new(sec: i64, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    /// Check that the nanosecond field is in range.
    pub fn validate(&self) -> Result<()> {
        if i64::from(self.nanosec) >= NANOS_PER_SEC {
            return Err(Error::InvalidNanoseconds(self.nanosec));
        }
        Ok(())
    }

    /// `sec * 1e9 + nanosec`, checked.
    pub fn to_nanos(&self) -> Result<i64> {
        self.validate()?;
        // Widen first: the floor split of i64::MIN has sec * 1e9 below i64::MIN.
        let nanos = i128::from(self.sec) * i128::from(NANOS_PER_SEC) + i128::from(self.nanosec);
        i64::try_from(nanos).map_err(|_| Error::TimestampOverflow)
    }

    /// Absolute distance between two stamps in nanoseconds.
    ///
    /// Subtracts component-wise and borrows one second when the sub-second
    /// remainder goes negative, so the result never depends on which side is
    /// larger. Saturates at `u64::MAX`.
    pub fn abs_delta(&self, other: &Stamp) -> u64 {
        let mut sec = i128::from(self.sec) - i128::from(other.sec);
        let mut nsec = i128::from(self.nanosec) - i128::from(other.nanosec);
        if nsec < 0 {
            sec -= 1;
            nsec += i128::from(NANOS_PER_SEC);
        }
        let total = (sec * i128::from(NANOS_PER_SEC) + nsec).unsigned_abs();
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nanosec)
    }
}

/// A point in a stream's timebase, in integer nanoseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from a raw nanosecond count.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from a `(sec, nanosec)` pair.
    pub fn from_parts(sec: i64, nanosec: u32) -> Result<Self> {
        Stamp::new(sec, nanosec).to_nanos().map(Self)
    }

    /// The raw nanosecond count.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Split back into `(sec, nanosec)` with floor division, so negative
    /// instants still carry an in-range nanosecond field.
    pub fn to_stamp(self) -> Stamp {
        // rem_euclid of a positive divisor is always in [0, 1e9)
        let nanosec = self.0.rem_euclid(NANOS_PER_SEC) as u32;
        Stamp::new(self.0.div_euclid(NANOS_PER_SEC), nanosec)
    }

    /// Absolute distance to another timestamp.
    pub fn abs_delta(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// `self - other` as a signed nanosecond count.
    pub fn signed_delta(self, other: Timestamp) -> Result<i64> {
        self.0.checked_sub(other.0).ok_or(Error::TimestampOverflow)
    }

    /// Shift by a signed nanosecond count.
    pub fn checked_shift(self, nanos: i64) -> Result<Self> {
        self.0
            .checked_add(nanos)
            .map(Self)
            .ok_or(Error::TimestampOverflow)
    }

    /// Seconds with a fractional part, for display only.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }
}

impl TryFrom<Stamp> for Timestamp {
    type Error = Error;

    fn try_from(stamp: Stamp) -> Result<Self> {
        stamp.to_nanos().map(Self)
    }
}

impl From<Timestamp> for Stamp {
    fn from(ts: Timestamp) -> Self {
        ts.to_stamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_stamp().fmt(f)
    }
}

/// Render a nanosecond delta in milliseconds. Display only.
pub fn delta_millis(delta_ns: u64) -> f64 {
    delta_ns as f64 / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_combines_fields() {
        let ts = Timestamp::from_parts(1_750_838_478, 817_840_000).unwrap();
        assert_eq!(ts.as_nanos(), 1_750_838_478_817_840_000);
    }

    #[test]
    fn from_parts_rejects_out_of_range_nanos() {
        assert_eq!(
            Timestamp::from_parts(1, 1_000_000_000),
            Err(Error::InvalidNanoseconds(1_000_000_000))
        );
        assert!(Timestamp::from_parts(1, 999_999_999).is_ok());
    }

    #[test]
    fn from_parts_detects_overflow() {
        assert_eq!(
            Timestamp::from_parts(i64::MAX, 0),
            Err(Error::TimestampOverflow)
        );
    }

    #[test]
    fn abs_delta_with_borrow() {
        let a = Stamp::new(5, 0);
        let b = Stamp::new(4, 999_999_999);
        assert_eq!(a.abs_delta(&b), 1);
        assert_eq!(b.abs_delta(&a), 1);
        assert_eq!(a.abs_delta(&a), 0);
    }

    #[test]
    fn to_stamp_floors_negative_values() {
        let stamp = Timestamp::from_nanos(-100).to_stamp();
        assert_eq!(stamp, Stamp::new(-1, 999_999_900));
        assert_eq!(Timestamp::try_from(stamp).unwrap().as_nanos(), -100);
    }

    #[test]
    fn display_pads_nanoseconds() {
        let ts = Timestamp::from_parts(12, 5).unwrap();
        assert_eq!(ts.to_string(), "12.000000005");
    }

    #[test]
    fn checked_shift() {
        let ts = Timestamp::from_nanos(750);
        assert_eq!(ts.checked_shift(250).unwrap(), Timestamp::from_nanos(1000));
        assert_eq!(
            Timestamp::from_nanos(i64::MAX).checked_shift(1),
            Err(Error::TimestampOverflow)
        );
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Timestamp::from_nanos(42)).unwrap();
        assert_eq!(json, "42");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_stamp() -> impl Strategy<Value = Stamp> {
            (-4_000_000_000i64..4_000_000_000, 0u32..1_000_000_000)
                .prop_map(|(sec, nanosec)| Stamp::new(sec, nanosec))
        }

        proptest! {
            #[test]
            fn prop_abs_delta_symmetric(a in arb_stamp(), b in arb_stamp()) {
                prop_assert_eq!(a.abs_delta(&b), b.abs_delta(&a));
                prop_assert_eq!(a.abs_delta(&a), 0);
            }

            #[test]
            fn prop_abs_delta_matches_integer_difference(a in arb_stamp(), b in arb_stamp()) {
                let ta = Timestamp::try_from(a).unwrap();
                let tb = Timestamp::try_from(b).unwrap();
                prop_assert_eq!(a.abs_delta(&b), ta.abs_delta(tb));
            }

            #[test]
            fn prop_stamp_roundtrip(nanos in any::<i64>()) {
                let ts = Timestamp::from_nanos(nanos);
                prop_assert_eq!(Timestamp::try_from(ts.to_stamp()).unwrap(), ts);
            }
        }
    }
}
