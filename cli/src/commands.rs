//! Command implementations over a JSON-lines session.

use crate::{
    codec::JsonStampCodec,
    config::ConfigError,
    error::Result,
    jsonl::{JsonlSession, JsonlWriter},
};
use serde::Serialize;
use stampsync_engine::{
    analyze_cadence, run_audit, AuditConfig, AuditReport, CadenceConfig, CadenceReport,
    ResequenceConfig, ResequenceReport, Resequencer, StreamName, Timestamp, TimestampCollector,
};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

/// Leading timestamps kept for display.
const PREVIEW_LEN: usize = 5;

/// Cadence findings for one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCadence {
    pub stream: StreamName,
    /// First few header times
    pub preview: Vec<Timestamp>,
    /// `None` when there are not enough messages
    pub report: Option<CadenceReport>,
}

/// Audit targets against a reference stream.
pub fn audit(session: &JsonlSession, config: &AuditConfig) -> Result<AuditReport> {
    Ok(run_audit(session, &JsonStampCodec, config)?)
}

/// Resequence `session` into a new file at `output`.
///
/// Nothing is written until the anchor and offsets are resolved. The rewrite
/// goes to a sibling `.partial` file that replaces `output` only on success.
pub fn resequence(
    session: &JsonlSession,
    output: &Path,
    config: &ResequenceConfig,
) -> Result<ResequenceReport> {
    if same_file(session.path(), output) {
        return Err(ConfigError::OutputIsInput(output.to_path_buf()).into());
    }

    let resequencer = Resequencer::new(session, &JsonStampCodec, config);
    let prepared = resequencer.prepare()?;

    let staging = staging_path(output);
    let mut writer = JsonlWriter::create(&staging)?;
    let written = resequencer.write(prepared, &mut writer);
    let count = writer.written();
    drop(writer);

    match written {
        Ok(report) => {
            fs::rename(&staging, output)?;
            tracing::debug!(written = count, "Output flushed");
            Ok(report)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&staging) {
                tracing::warn!("Could not remove {}: {}", staging.display(), cleanup);
            }
            Err(e.into())
        }
    }
}

fn staging_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

// Only existing paths can alias; a missing output never equals the input.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Interval statistics for each of `streams`.
pub fn cadence(
    session: &JsonlSession,
    streams: &[StreamName],
    config: &CadenceConfig,
) -> Result<Vec<StreamCadence>> {
    let collector = TimestampCollector::new(session, &JsonStampCodec);
    streams
        .iter()
        .map(|stream| {
            let timestamps = collector.collect(stream)?;
            Ok(StreamCadence {
                stream: stream.clone(),
                preview: timestamps.iter().take(PREVIEW_LEN).copied().collect(),
                report: analyze_cadence(&timestamps, config),
            })
        })
        .collect()
}
