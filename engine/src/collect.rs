//! Timestamp collection passes.
//!
//! Each call is one full forward pass over the session, decoding only the
//! messages of the requested stream.

use crate::{
    codec::Codec,
    error::Result,
    session::SessionSource,
    timestamp::Timestamp,
    StreamName,
};
use serde::{Deserialize, Serialize};

/// The header timestamps of one stream, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTimestamps {
    pub stream: StreamName,
    pub timestamps: Vec<Timestamp>,
}

impl StreamTimestamps {
    /// Create a named timestamp sequence.
    pub fn new(stream: impl Into<StreamName>, timestamps: Vec<Timestamp>) -> Self {
        Self {
            stream: stream.into(),
            timestamps,
        }
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the stream had no messages.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Reads header timestamps of individual streams out of a session.
pub struct TimestampCollector<'a, S: ?Sized, C> {
    source: &'a S,
    codec: &'a C,
}

impl<'a, S, C> TimestampCollector<'a, S, C>
where
    S: SessionSource + ?Sized,
    C: Codec,
{
    /// Create a collector over a session and codec.
    pub fn new(source: &'a S, codec: &'a C) -> Self {
        Self { source, codec }
    }

    /// All header timestamps of `stream`, in arrival order.
    pub fn collect(&self, stream: &str) -> Result<Vec<Timestamp>> {
        let mut timestamps = Vec::new();
        for message in self.source.messages()? {
            let message = message?;
            if message.stream != stream {
                continue;
            }
            timestamps.push(self.codec.timestamp(stream, &message.data)?);
        }
        Ok(timestamps)
    }

    /// Like [`collect`](Self::collect), keeping the stream name attached.
    pub fn collect_stream(&self, stream: &str) -> Result<StreamTimestamps> {
        self.collect(stream)
            .map(|timestamps| StreamTimestamps::new(stream, timestamps))
    }

    /// Header timestamp of the first message on `stream`, if any.
    ///
    /// Stops reading as soon as it is found.
    pub fn first(&self, stream: &str) -> Result<Option<Timestamp>> {
        for message in self.source.messages()? {
            let message = message?;
            if message.stream == stream {
                return self.codec.timestamp(stream, &message.data).map(Some);
            }
        }
        Ok(None)
    }
}
