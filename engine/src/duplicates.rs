//! Exact-duplicate detection within one stream.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A repeated timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duplicate {
    /// Index of the repeat
    pub index: usize,
    /// Index where the value first appeared
    pub first_index: usize,
    /// The repeated value
    pub timestamp: Timestamp,
}

/// Report every index whose timestamp equals an earlier one.
///
/// A value seen `k` times yields `k - 1` duplicates, all pointing at the
/// first occurrence.
pub fn find_duplicates(timestamps: &[Timestamp]) -> Vec<Duplicate> {
    let mut first_seen: HashMap<Timestamp, usize> = HashMap::with_capacity(timestamps.len());
    let mut duplicates = Vec::new();

    for (index, &timestamp) in timestamps.iter().enumerate() {
        match first_seen.get(&timestamp) {
            Some(&first_index) => duplicates.push(Duplicate {
                index,
                first_index,
                timestamp,
            }),
            None => {
                first_seen.insert(timestamp, index);
            }
        }
    }

    duplicates
}
