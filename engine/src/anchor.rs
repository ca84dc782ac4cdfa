//! Common anchor instant across a group of streams.

use crate::{
    collect::StreamTimestamps,
    error::{Error, Result},
    timestamp::Timestamp,
    StreamName,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Minimum number of streams an anchor is resolved over.
pub const MIN_ANCHOR_STREAMS: usize = 2;

/// The earliest timestamp present on every stream of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub timestamp: Timestamp,
    /// Index of the anchor's first occurrence in each stream
    pub first_indices: BTreeMap<StreamName, usize>,
}

/// Intersect the timestamp sets of `streams` and take the minimum.
///
/// Duplicates within a stream collapse. Fails if fewer than two streams are
/// given, if any stream is empty, or if no value is shared by all of them.
pub fn resolve_anchor(streams: &[StreamTimestamps]) -> Result<Anchor> {
    if streams.len() < MIN_ANCHOR_STREAMS {
        return Err(Error::InsufficientStreams {
            required: MIN_ANCHOR_STREAMS,
            actual: streams.len(),
        });
    }
    if let Some(empty) = streams.iter().find(|s| s.timestamps.is_empty()) {
        return Err(Error::EmptyStream(empty.stream.clone()));
    }

    let mut common: BTreeSet<Timestamp> = streams[0].timestamps.iter().copied().collect();
    for other in &streams[1..] {
        let set: HashSet<Timestamp> = other.timestamps.iter().copied().collect();
        common.retain(|ts| set.contains(ts));
        if common.is_empty() {
            break;
        }
    }

    let timestamp = common.first().copied().ok_or_else(|| {
        Error::NoCommonTimestamp(streams.iter().map(|s| s.stream.clone()).collect())
    })?;

    let first_indices = streams
        .iter()
        .filter_map(|s| {
            s.timestamps
                .iter()
                .position(|&ts| ts == timestamp)
                .map(|i| (s.stream.clone(), i))
        })
        .collect();

    Ok(Anchor {
        timestamp,
        first_indices,
    })
}
