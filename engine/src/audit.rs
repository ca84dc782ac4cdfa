//! Synchronization audit of target streams against a reference stream.
//!
//! One collection pass per stream, then duplicate detection and forward
//! matching on the in-memory sequences. Findings are data, not errors: only
//! an empty reference stream aborts the audit.

use crate::{
    codec::Codec,
    collect::TimestampCollector,
    duplicates::{find_duplicates, Duplicate},
    error::{Error, Result},
    matcher::{match_forward, MatchReport},
    session::SessionSource,
    StreamName,
};
use serde::{Deserialize, Serialize};

/// Which streams to audit and how strictly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    pub reference: StreamName,
    pub targets: Vec<StreamName>,
    /// Largest acceptable delta between matched timestamps
    pub tolerance_ns: u64,
}

impl AuditConfig {
    /// Create an audit of `targets` against `reference`.
    pub fn new(
        reference: impl Into<StreamName>,
        targets: impl IntoIterator<Item = impl Into<StreamName>>,
        tolerance_ns: u64,
    ) -> Self {
        Self {
            reference: reference.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            tolerance_ns,
        }
    }
}

/// Per-stream findings that do not depend on another stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCheck {
    pub stream: StreamName,
    pub message_count: usize,
    pub duplicates: Vec<Duplicate>,
}

/// Findings for one target stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudit {
    pub check: StreamCheck,
    pub matching: MatchReport,
}

/// Full audit outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub tolerance_ns: u64,
    pub reference: StreamCheck,
    pub targets: Vec<TargetAudit>,
    /// Targets without any message
    pub skipped: Vec<StreamName>,
}

impl AuditReport {
    /// Pairs checked across all targets.
    pub fn pairs_checked(&self) -> usize {
        self.targets.iter().map(|t| t.matching.pairs_checked).sum()
    }

    /// Pairs outside the tolerance across all targets.
    pub fn exceeded(&self) -> usize {
        self.targets.iter().map(|t| t.matching.exceeded).sum()
    }

    /// Duplicates across the reference and all targets.
    pub fn duplicate_count(&self) -> usize {
        self.reference.duplicates.len()
            + self
                .targets
                .iter()
                .map(|t| t.check.duplicates.len())
                .sum::<usize>()
    }

    /// Check if nothing was flagged and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.exceeded() == 0 && self.duplicate_count() == 0 && self.skipped.is_empty()
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Report(e.to_string()))
    }
}

/// Run the audit described by `config`.
pub fn run_audit<S, C>(source: &S, codec: &C, config: &AuditConfig) -> Result<AuditReport>
where
    S: SessionSource + ?Sized,
    C: Codec,
{
    let collector = TimestampCollector::new(source, codec);

    let reference = collector.collect(&config.reference)?;
    if reference.is_empty() {
        return Err(Error::EmptyStream(config.reference.clone()));
    }
    let reference_check = StreamCheck {
        stream: config.reference.clone(),
        message_count: reference.len(),
        duplicates: find_duplicates(&reference),
    };

    let mut targets = Vec::with_capacity(config.targets.len());
    let mut skipped = Vec::new();

    for stream in &config.targets {
        let timestamps = collector.collect(stream)?;
        if timestamps.is_empty() {
            skipped.push(stream.clone());
            continue;
        }
        targets.push(TargetAudit {
            check: StreamCheck {
                stream: stream.clone(),
                message_count: timestamps.len(),
                duplicates: find_duplicates(&timestamps),
            },
            matching: match_forward(&reference, &timestamps, config.tolerance_ns),
        });
    }

    Ok(AuditReport {
        tolerance_ns: config.tolerance_ns,
        reference: reference_check,
        targets,
        skipped,
    })
}
