//! Renders engine reports as log lines.

use crate::commands::StreamCadence;
use chrono::DateTime;
use stampsync_engine::{
    timestamp::delta_millis, AuditReport, MatchResult, ResequenceReport, ScanMode, StreamCheck,
    Timestamp,
};

/// Wall-clock rendering of a timestamp taken as nanoseconds since the Unix epoch.
pub fn format_utc(ts: Timestamp) -> String {
    let stamp = ts.to_stamp();
    match DateTime::from_timestamp(stamp.sec, stamp.nanosec) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => "out of range".to_string(),
    }
}

/// One out-of-tolerance pair.
pub fn format_pair(m: &MatchResult) -> String {
    format!(
        "ref[{}] vs tgt[{}]  Δ={:.3} ms  ref={}  tgt={}",
        m.reference_index,
        m.target_index,
        delta_millis(m.delta_ns),
        m.reference,
        m.target
    )
}

fn log_duplicates(check: &StreamCheck) {
    if check.duplicates.is_empty() {
        tracing::info!("No duplicate timestamps found in {}", check.stream);
        return;
    }
    for d in &check.duplicates {
        tracing::warn!(
            "Duplicate timestamp in {} at index {} (same as index {}): {}",
            check.stream,
            d.index,
            d.first_index,
            d.timestamp
        );
    }
}

/// Log the findings of an audit.
pub fn log_audit(report: &AuditReport) {
    tracing::info!(
        stream = %report.reference.stream,
        messages = report.reference.message_count,
        "Checking reference"
    );
    log_duplicates(&report.reference);

    for stream in &report.skipped {
        tracing::warn!("No messages on {}, skipping", stream);
    }

    for target in &report.targets {
        tracing::info!(
            stream = %target.check.stream,
            messages = target.check.message_count,
            "Checking target"
        );
        log_duplicates(&target.check);

        let matching = &target.matching;
        if matching.mode == ScanMode::FullScan {
            tracing::warn!(
                "{} or the reference is not in time order, matched with a full scan",
                target.check.stream
            );
        }
        for pair in matching.out_of_tolerance() {
            tracing::warn!("{}", format_pair(pair));
        }
        if matching.terminated_early() {
            tracing::warn!(
                "{} ran out after {} pairs, {} reference messages unmatched",
                target.check.stream,
                matching.pairs_checked,
                matching.unmatched_reference
            );
        }
        tracing::info!(
            "Checked {} pairs, {} exceeded tolerance ({} ns)",
            matching.pairs_checked,
            matching.exceeded,
            report.tolerance_ns
        );
    }

    if report.is_clean() {
        tracing::info!("All streams in sync");
    } else {
        tracing::info!(
            pairs = report.pairs_checked(),
            exceeded = report.exceeded(),
            duplicates = report.duplicate_count(),
            skipped = report.skipped.len(),
            "Audit finished with findings"
        );
    }
}

/// Log the outcome of a resequencing run.
pub fn log_resequence(report: &ResequenceReport) {
    let anchor = report.anchor.timestamp;
    tracing::info!(
        "Anchor ts: {} ns ({:.6} s)",
        anchor.as_nanos(),
        anchor.as_secs_f64()
    );
    for (stream, index) in &report.anchor.first_indices {
        tracing::debug!("First index on {}: {}", stream, index);
    }

    for summary in &report.sync_streams {
        tracing::debug!(
            stream = %summary.stream,
            messages = summary.message_count,
            duplicates = summary.duplicates.len(),
            "Sync stream collected"
        );
    }

    for domain in &report.offsets {
        tracing::info!("{} time offset: {}", domain.stream, domain.offset);
        tracing::debug!(
            "First {} ts: {} ns ({:.6} s)",
            domain.stream,
            domain.first.as_nanos(),
            domain.first.as_secs_f64()
        );
    }

    for dropped in &report.stats.dropped {
        tracing::warn!(
            "Skipping duplicate timestamp on {} at {}",
            dropped.stream,
            dropped.timestamp.as_nanos()
        );
    }

    let stats = &report.stats;
    tracing::info!(
        read = stats.messages_read,
        written = stats.messages_written(),
        passed_through = stats.passed_through,
        shifted = stats.shifted,
        managed = stats.managed_written,
        dropped = stats.dropped.len(),
        "Resequenced session written"
    );
}

/// Log interval statistics.
pub fn log_cadence(found: &[StreamCadence]) {
    for entry in found {
        tracing::info!("Processing {}", entry.stream);
        for (i, ts) in entry.preview.iter().enumerate() {
            tracing::debug!("  [{}] {:.9}  ({})", i, ts.as_secs_f64(), format_utc(*ts));
        }

        let Some(report) = &entry.report else {
            tracing::warn!("Not enough messages on {} for interval statistics", entry.stream);
            continue;
        };

        if report.zero_intervals > 0 {
            tracing::warn!("{} zero intervals on {}", report.zero_intervals, entry.stream);
        }
        if report.backward_steps > 0 {
            tracing::warn!(
                "{} backward steps on {}",
                report.backward_steps,
                entry.stream
            );
        }
        tracing::info!("Average interval: {:.3} ms", report.mean_ns / 1e6);
        tracing::info!("Std deviation   : {:.3} ms", report.std_dev_ns / 1e6);
        tracing::info!("Max interval    : {:.3} ms", report.max_ns as f64 / 1e6);
        tracing::info!(
            "Off period      : {} / {} (expected {} ns ± {} ns)",
            report.off_period,
            report.intervals,
            report.expected_period_ns,
            report.tolerance_ns
        );
    }
}
