//! Forward-only nearest-neighbour matching between two timestamp streams.
//!
//! # Algorithm
//!
//! For each reference timestamp, in order:
//!
//! 1. Scan the target stream from the cursor, tracking the smallest delta
//! 2. On a non-decreasing target, `|ref - target[i]|` falls and then rises,
//!    so the scan stops at the first strict increase
//! 3. The cursor moves one past the matched index; a target is never reused
//! 4. Once the target is exhausted, the remaining references go unmatched
//!
//! Over a full pass this is O(n + m). If either input is not sorted the
//! stop-at-increase shortcut could return a wrong neighbour, so the matcher
//! falls back to scanning the whole remaining target for every reference.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// How the target stream is scanned for each reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanMode {
    /// Stop at the first increase in delta (inputs sorted)
    #[default]
    Monotonic,
    /// Scan to the end of the target every time (inputs unsorted)
    FullScan,
}

/// One reference/target pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub reference_index: usize,
    pub target_index: usize,
    pub reference: Timestamp,
    pub target: Timestamp,
    /// Absolute distance in nanoseconds
    pub delta_ns: u64,
    /// `delta_ns <= tolerance`
    pub within_tolerance: bool,
}

/// Stateful matcher over one target stream.
#[derive(Debug, Clone)]
pub struct ForwardMatcher<'a> {
    target: &'a [Timestamp],
    cursor: usize,
    tolerance_ns: u64,
    mode: ScanMode,
}

impl<'a> ForwardMatcher<'a> {
    /// Create a matcher starting at target index 0.
    ///
    /// The scan mode is chosen from the target's ordering.
    pub fn new(target: &'a [Timestamp], tolerance_ns: u64) -> Self {
        let mode = if is_non_decreasing(target) {
            ScanMode::Monotonic
        } else {
            ScanMode::FullScan
        };
        Self {
            target,
            cursor: 0,
            tolerance_ns,
            mode,
        }
    }

    /// Start from a different target index.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    /// Force a scan mode.
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Next target index that may be matched.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Scan mode in use.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Check if every target has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.target.len()
    }

    /// Match one reference timestamp, consuming the chosen target.
    ///
    /// Returns `None` once the target stream is exhausted.
    pub fn next_match(
        &mut self,
        reference_index: usize,
        reference: Timestamp,
    ) -> Option<MatchResult> {
        let remaining = self.target.get(self.cursor..)?;
        let mut best: Option<(usize, u64)> = None;

        for (offset, &candidate) in remaining.iter().enumerate() {
            let delta = reference.abs_delta(candidate);
            match best {
                Some((_, best_delta)) if delta < best_delta => {
                    best = Some((self.cursor + offset, delta))
                }
                Some((_, best_delta)) if delta > best_delta && self.mode == ScanMode::Monotonic => {
                    break
                }
                Some(_) => {}
                None => best = Some((self.cursor + offset, delta)),
            }
        }

        let (target_index, delta_ns) = best?;
        self.cursor = target_index + 1;

        Some(MatchResult {
            reference_index,
            target_index,
            reference,
            target: self.target[target_index],
            delta_ns,
            within_tolerance: delta_ns <= self.tolerance_ns,
        })
    }
}

/// Outcome of matching a whole reference stream against a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub tolerance_ns: u64,
    pub mode: ScanMode,
    pub matches: Vec<MatchResult>,
    /// Number of pairs formed
    pub pairs_checked: usize,
    /// Pairs whose delta exceeds the tolerance
    pub exceeded: usize,
    /// References left without a partner after the target ran out
    pub unmatched_reference: usize,
}

impl MatchReport {
    /// Pairs outside the tolerance, in reference order.
    pub fn out_of_tolerance(&self) -> impl Iterator<Item = &MatchResult> {
        self.matches.iter().filter(|m| !m.within_tolerance)
    }

    /// Check if matching stopped before the reference stream ended.
    pub fn terminated_early(&self) -> bool {
        self.unmatched_reference > 0
    }
}

/// Match every reference timestamp against `target`.
pub fn match_forward(
    reference: &[Timestamp],
    target: &[Timestamp],
    tolerance_ns: u64,
) -> MatchReport {
    let mut matcher = ForwardMatcher::new(target, tolerance_ns);
    if !is_non_decreasing(reference) {
        matcher = matcher.with_mode(ScanMode::FullScan);
    }

    let mut matches = Vec::with_capacity(reference.len().min(target.len()));
    for (index, &ts) in reference.iter().enumerate() {
        match matcher.next_match(index, ts) {
            Some(m) => matches.push(m),
            None => break,
        }
    }

    let exceeded = matches.iter().filter(|m| !m.within_tolerance).count();
    MatchReport {
        tolerance_ns,
        mode: matcher.mode(),
        pairs_checked: matches.len(),
        exceeded,
        unmatched_reference: reference.len() - matches.len(),
        matches,
    }
}

/// Check if a sequence never steps backwards.
pub fn is_non_decreasing(timestamps: &[Timestamp]) -> bool {
    timestamps.windows(2).all(|w| w[0] <= w[1])
}
