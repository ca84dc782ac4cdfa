//! Constant offsets that re-base an independent clock domain onto an anchor.

use crate::{
    error::{Error, Result},
    timestamp::Timestamp,
    StreamName,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed nanosecond shift applied to every timestamp of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainOffset(i64);

impl DomainOffset {
    /// Create an offset from a raw nanosecond count.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// `anchor - first`: the shift that moves `first` onto `anchor`.
    pub fn between(anchor: Timestamp, first: Timestamp) -> Result<Self> {
        anchor.signed_delta(first).map(Self)
    }

    /// The raw nanosecond count.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Shift a timestamp of this domain.
    pub fn apply(self, ts: Timestamp) -> Result<Timestamp> {
        ts.checked_shift(self.0)
    }
}

impl fmt::Display for DomainOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ns ({:.6} s)", self.0, self.0 as f64 / 1e9)
    }
}

/// A clock domain aligned onto an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetDomain {
    pub stream: StreamName,
    /// First header time read from the domain
    pub first: Timestamp,
    pub offset: DomainOffset,
}

/// Offset for `stream` given its first timestamp.
///
/// A domain with no messages cannot be aligned and is an error.
pub fn compute_offset(
    stream: &str,
    anchor: Timestamp,
    first: Option<Timestamp>,
) -> Result<OffsetDomain> {
    let first = first.ok_or_else(|| Error::EmptyStream(stream.to_string()))?;
    Ok(OffsetDomain {
        stream: stream.to_string(),
        first,
        offset: DomainOffset::between(anchor, first)?,
    })
}
