//! The rewrite pass.
//!
//! Replays a session once, in arrival order, and decides one disposition per
//! message from the role of its stream:
//!
//! - **Pass-through**: written unchanged with its original log time
//! - **Offset**: decoded, shifted by the domain offset, re-encoded, and
//!   written at the shifted time; never dropped
//! - **Managed**: written at its header time unless that time equals the
//!   last one written on the same stream, in which case it is dropped
//!
//! Only the last written timestamp of each managed stream is kept between
//! messages; payloads are never buffered.

use crate::{
    codec::{Codec, Stamped},
    error::{Error, Result},
    offset::DomainOffset,
    session::{Message, SessionSink, SessionSource, StreamMetadata},
    timestamp::Timestamp,
    StreamName,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the rewrite pass does with a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum StreamRole {
    /// Re-emit unchanged (default for undesignated streams)
    #[default]
    PassThrough,
    /// Re-stamp by a constant offset
    Offset { offset: DomainOffset },
    /// Drop consecutive repeats of the header time
    Managed,
}

/// Role assignment for every stream of a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResequencePlan {
    roles: HashMap<StreamName, StreamRole>,
}

impl ResequencePlan {
    /// Create a plan where every stream passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a stream as managed.
    pub fn with_managed(mut self, stream: impl Into<StreamName>) -> Self {
        self.roles.insert(stream.into(), StreamRole::Managed);
        self
    }

    /// Mark a stream as an offset domain.
    pub fn with_offset(mut self, stream: impl Into<StreamName>, offset: DomainOffset) -> Self {
        self.roles.insert(stream.into(), StreamRole::Offset { offset });
        self
    }

    /// Role of a stream.
    pub fn role(&self, stream: &str) -> StreamRole {
        self.roles.get(stream).copied().unwrap_or_default()
    }
}

/// A managed message that was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedDuplicate {
    pub stream: StreamName,
    pub timestamp: Timestamp,
    /// Position of the message in the source session
    pub position: usize,
}

/// Outcome of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    PassedThrough,
    Shifted { from: Timestamp, to: Timestamp },
    Written(Timestamp),
    Dropped(DroppedDuplicate),
}

/// Counters for a finished rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteStats {
    pub messages_read: usize,
    pub passed_through: usize,
    pub shifted: usize,
    pub managed_written: usize,
    pub dropped: Vec<DroppedDuplicate>,
}

impl WriteStats {
    /// Messages that reached the sink.
    pub fn messages_written(&self) -> usize {
        self.passed_through + self.shifted + self.managed_written
    }
}

/// Streaming writer applying a [`ResequencePlan`].
pub struct ResequencingWriter<'a, C, W: ?Sized> {
    plan: &'a ResequencePlan,
    codec: &'a C,
    sink: &'a mut W,
    last_written: HashMap<StreamName, Timestamp>,
    stats: WriteStats,
}

impl<'a, C, W> ResequencingWriter<'a, C, W>
where
    C: Codec,
    W: SessionSink + ?Sized,
{
    /// Create a writer. Streams must already be declared on `sink`.
    pub fn new(plan: &'a ResequencePlan, codec: &'a C, sink: &'a mut W) -> Self {
        Self {
            plan,
            codec,
            sink,
            last_written: HashMap::new(),
            stats: WriteStats::default(),
        }
    }

    /// Last header time written on a managed stream.
    pub fn last_written(&self, stream: &str) -> Option<Timestamp> {
        self.last_written.get(stream).copied()
    }

    /// Process the next message of the session.
    pub fn write(&mut self, message: Message) -> Result<Disposition> {
        let position = self.stats.messages_read;
        self.stats.messages_read += 1;

        match self.plan.role(&message.stream) {
            StreamRole::PassThrough => {
                self.sink
                    .write(&message.stream, &message.data, message.log_time)?;
                self.stats.passed_through += 1;
                Ok(Disposition::PassedThrough)
            }
            StreamRole::Offset { offset } => self.write_shifted(message, offset),
            StreamRole::Managed => self.write_managed(message, position),
        }
    }

    fn write_shifted(&mut self, message: Message, offset: DomainOffset) -> Result<Disposition> {
        let stream = message.stream.as_str();
        let mut record = self.codec.decode(stream, &message.data)?;
        let from = Timestamp::try_from(record.stamp()).map_err(|e| Error::decode(stream, e))?;
        let to = offset.apply(from)?;

        record.set_stamp(to.to_stamp());
        let data = self.codec.encode(stream, &record)?;
        self.sink.write(stream, &data, to.as_nanos())?;

        self.stats.shifted += 1;
        Ok(Disposition::Shifted { from, to })
    }

    fn write_managed(&mut self, message: Message, position: usize) -> Result<Disposition> {
        let ts = self.codec.timestamp(&message.stream, &message.data)?;

        if self.last_written.get(&message.stream) == Some(&ts) {
            let dropped = DroppedDuplicate {
                stream: message.stream,
                timestamp: ts,
                position,
            };
            self.stats.dropped.push(dropped.clone());
            return Ok(Disposition::Dropped(dropped));
        }

        self.sink
            .write(&message.stream, &message.data, ts.as_nanos())?;
        self.last_written.insert(message.stream, ts);
        self.stats.managed_written += 1;
        Ok(Disposition::Written(ts))
    }

    /// Flush the sink and return the counters.
    pub fn finish(self) -> Result<WriteStats> {
        self.sink.finish()?;
        Ok(self.stats)
    }
}

/// Declare every source stream on `sink`, then rewrite the whole session.
pub fn resequence<S, C, W>(
    source: &S,
    plan: &ResequencePlan,
    codec: &C,
    sink: &mut W,
) -> Result<WriteStats>
where
    S: SessionSource + ?Sized,
    C: Codec,
    W: SessionSink + ?Sized,
{
    let streams = source.streams()?;
    resequence_declared(source, &streams, plan, codec, sink)
}

/// Like [`resequence`], with the source's stream list already read.
pub fn resequence_declared<S, C, W>(
    source: &S,
    streams: &[StreamMetadata],
    plan: &ResequencePlan,
    codec: &C,
    sink: &mut W,
) -> Result<WriteStats>
where
    S: SessionSource + ?Sized,
    C: Codec,
    W: SessionSink + ?Sized,
{
    for metadata in streams {
        sink.declare_stream(metadata)?;
    }

    let mut writer = ResequencingWriter::new(plan, codec, sink);
    for message in source.messages()? {
        writer.write(message?)?;
    }
    writer.finish()
}
