//! Multi-phase resequencing of a recorded session.
//!
//! # Phases
//!
//! 1. **Collect**: one pass per sync stream gathers its header timestamps
//! 2. **Anchor**: the earliest timestamp shared by every sync stream
//! 3. **Offsets**: one pass per offset domain reads its first timestamp and
//!    derives the shift onto the anchor
//! 4. **Rewrite**: a final pass applies the resulting [`ResequencePlan`]
//!
//! Every phase needs the previous one's result, so the passes are never
//! fused. Each phase is exposed separately. [`Resequencer::prepare`] runs
//! the first three and [`Resequencer::write`] the last, so a file-backed
//! sink need not exist until the anchor and offsets are known;
//! [`Resequencer::run`] chains both.

use crate::{
    anchor::{resolve_anchor, Anchor},
    codec::Codec,
    collect::{StreamTimestamps, TimestampCollector},
    duplicates::{find_duplicates, Duplicate},
    error::{Error, Result},
    offset::{compute_offset, OffsetDomain},
    resequence::{resequence_declared, ResequencePlan, WriteStats},
    session::{SessionSink, SessionSource, StreamMetadata},
    StreamName,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stream roles for a resequencing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResequenceConfig {
    /// Streams that define the anchor and get deduplicated
    pub sync_streams: Vec<StreamName>,
    /// Independently clocked streams shifted onto the anchor
    pub offset_streams: Vec<StreamName>,
}

impl ResequenceConfig {
    /// Create a config with the given sync streams and no offset domains.
    pub fn new(sync_streams: impl IntoIterator<Item = impl Into<StreamName>>) -> Self {
        Self {
            sync_streams: sync_streams.into_iter().map(Into::into).collect(),
            offset_streams: Vec::new(),
        }
    }

    /// Add an offset domain.
    pub fn with_offset_stream(mut self, stream: impl Into<StreamName>) -> Self {
        self.offset_streams.push(stream.into());
        self
    }

    /// Reject a stream configured twice or in both roles.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for stream in self.sync_streams.iter().chain(&self.offset_streams) {
            if !seen.insert(stream.as_str()) {
                return Err(Error::ConflictingRole(stream.clone()));
            }
        }
        Ok(())
    }
}

/// Summary of one sync stream after collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStreamSummary {
    pub stream: StreamName,
    pub message_count: usize,
    /// Index of the anchor in this stream
    pub anchor_index: usize,
    /// Repeats found during collection
    pub duplicates: Vec<Duplicate>,
}

/// Outcome of a resequencing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResequenceReport {
    pub anchor: Anchor,
    pub sync_streams: Vec<SyncStreamSummary>,
    pub offsets: Vec<OffsetDomain>,
    pub stats: WriteStats,
}

impl ResequenceReport {
    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Report(e.to_string()))
    }
}

/// Results of the read-only phases, consumed by [`Resequencer::write`].
#[derive(Debug, Clone)]
pub struct PreparedRun {
    streams: Vec<StreamMetadata>,
    collected: Vec<StreamTimestamps>,
    anchor: Anchor,
    offsets: Vec<OffsetDomain>,
    plan: ResequencePlan,
}

impl PreparedRun {
    /// The resolved anchor.
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// The aligned offset domains.
    pub fn offsets(&self) -> &[OffsetDomain] {
        &self.offsets
    }

    /// The plan the rewrite will apply.
    pub fn plan(&self) -> &ResequencePlan {
        &self.plan
    }
}

/// Drives the resequencing phases over one source session.
pub struct Resequencer<'a, S: ?Sized, C> {
    source: &'a S,
    codec: &'a C,
    config: &'a ResequenceConfig,
}

impl<'a, S, C> Resequencer<'a, S, C>
where
    S: SessionSource + ?Sized,
    C: Codec,
{
    /// Create a resequencer.
    pub fn new(source: &'a S, codec: &'a C, config: &'a ResequenceConfig) -> Self {
        Self {
            source,
            codec,
            config,
        }
    }

    /// Check the config against the streams the session declares.
    pub fn validate(&self) -> Result<()> {
        self.declared_streams().map(|_| ())
    }

    fn declared_streams(&self) -> Result<Vec<StreamMetadata>> {
        self.config.validate()?;
        let streams = self.source.streams()?;
        let declared: HashSet<&str> = streams.iter().map(|s| s.name.as_str()).collect();
        for stream in self
            .config
            .sync_streams
            .iter()
            .chain(&self.config.offset_streams)
        {
            if !declared.contains(stream.as_str()) {
                return Err(Error::UnknownStream(stream.clone()));
            }
        }
        Ok(streams)
    }

    /// Phase 1: timestamps of every sync stream.
    pub fn collect(&self) -> Result<Vec<StreamTimestamps>> {
        let collector = TimestampCollector::new(self.source, self.codec);
        self.config
            .sync_streams
            .iter()
            .map(|stream| collector.collect_stream(stream))
            .collect()
    }

    /// Phase 2: the common anchor.
    pub fn anchor(&self, collected: &[StreamTimestamps]) -> Result<Anchor> {
        resolve_anchor(collected)
    }

    /// Phase 3: offsets of every offset domain.
    pub fn offsets(&self, anchor: &Anchor) -> Result<Vec<OffsetDomain>> {
        let collector = TimestampCollector::new(self.source, self.codec);
        self.config
            .offset_streams
            .iter()
            .map(|stream| compute_offset(stream, anchor.timestamp, collector.first(stream)?))
            .collect()
    }

    /// The role assignment the rewrite pass applies.
    pub fn plan(&self, offsets: &[OffsetDomain]) -> ResequencePlan {
        let plan = self
            .config
            .sync_streams
            .iter()
            .fold(ResequencePlan::new(), |plan, s| plan.with_managed(s.clone()));
        offsets
            .iter()
            .fold(plan, |plan, d| plan.with_offset(d.stream.clone(), d.offset))
    }

    /// Validate, then run every phase that only reads the source.
    ///
    /// Every fatal condition except a decode or sink failure during the
    /// rewrite surfaces here, so a caller can defer opening its output
    /// until this succeeds.
    pub fn prepare(&self) -> Result<PreparedRun> {
        let streams = self.declared_streams()?;
        let collected = self.collect()?;
        let anchor = self.anchor(&collected)?;
        let offsets = self.offsets(&anchor)?;
        let plan = self.plan(&offsets);

        Ok(PreparedRun {
            streams,
            collected,
            anchor,
            offsets,
            plan,
        })
    }

    /// Phase 4: rewrite the session into `sink`.
    pub fn write<W>(&self, prepared: PreparedRun, sink: &mut W) -> Result<ResequenceReport>
    where
        W: SessionSink + ?Sized,
    {
        let PreparedRun {
            streams,
            collected,
            anchor,
            offsets,
            plan,
        } = prepared;
        let stats = resequence_declared(self.source, &streams, &plan, self.codec, sink)?;

        let sync_streams = collected
            .iter()
            .map(|s| SyncStreamSummary {
                stream: s.stream.clone(),
                message_count: s.len(),
                anchor_index: anchor.first_indices.get(&s.stream).copied().unwrap_or(0),
                duplicates: find_duplicates(&s.timestamps),
            })
            .collect();

        Ok(ResequenceReport {
            anchor,
            sync_streams,
            offsets,
            stats,
        })
    }

    /// Run all phases.
    pub fn run<W>(&self, sink: &mut W) -> Result<ResequenceReport>
    where
        W: SessionSink + ?Sized,
    {
        let prepared = self.prepare()?;
        self.write(prepared, sink)
    }
}
