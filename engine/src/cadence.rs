//! Inter-message interval statistics for one stream.
//!
//! Used to check that a fixed-rate stream (an IMU at 500 Hz, say) really
//! ticks at its nominal period.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Expected cadence of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadenceConfig {
    pub expected_period_ns: u64,
    /// Allowed distance from the expected period
    pub tolerance_ns: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        // 500 Hz within a microsecond
        Self {
            expected_period_ns: 2_000_000,
            tolerance_ns: 1_000,
        }
    }
}

/// Interval statistics. Zero intervals are counted but left out of every
/// other figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadenceReport {
    pub samples: usize,
    /// Non-zero intervals
    pub intervals: usize,
    pub zero_intervals: usize,
    /// Intervals where time went backwards
    pub backward_steps: usize,
    pub mean_ns: f64,
    /// Population standard deviation
    pub std_dev_ns: f64,
    pub min_ns: i64,
    pub max_ns: i64,
    /// Intervals further than the tolerance from the expected period
    pub off_period: usize,
    pub expected_period_ns: u64,
    pub tolerance_ns: u64,
}

/// Analyze the intervals between consecutive timestamps.
///
/// Returns `None` when there are fewer than two samples or every interval
/// is zero.
pub fn analyze_cadence(timestamps: &[Timestamp], config: &CadenceConfig) -> Option<CadenceReport> {
    if timestamps.len() < 2 {
        return None;
    }

    let intervals = || {
        timestamps
            .windows(2)
            .map(|w| i128::from(w[1].as_nanos()) - i128::from(w[0].as_nanos()))
            .filter(|&dt| dt != 0)
    };

    let zero_intervals = timestamps.len() - 1 - intervals().count();
    let count = intervals().count();
    if count == 0 {
        return None;
    }

    let sum: i128 = intervals().sum();
    let mean = sum as f64 / count as f64;
    let variance = intervals()
        .map(|dt| {
            let d = dt as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / count as f64;

    let expected = i128::from(config.expected_period_ns);
    let tolerance = i128::from(config.tolerance_ns);
    let clamp = |v: i128| i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX });

    Some(CadenceReport {
        samples: timestamps.len(),
        intervals: count,
        zero_intervals,
        backward_steps: intervals().filter(|&dt| dt < 0).count(),
        mean_ns: mean,
        std_dev_ns: variance.sqrt(),
        min_ns: intervals().min().map(clamp).unwrap_or_default(),
        max_ns: intervals().max().map(clamp).unwrap_or_default(),
        off_period: intervals()
            .filter(|&dt| (dt - expected).abs() > tolerance)
            .count(),
        expected_period_ns: config.expected_period_ns,
        tolerance_ns: config.tolerance_ns,
    })
}
