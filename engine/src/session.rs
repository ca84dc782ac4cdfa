//! Session containers: the forward-only message log the engine reads and writes.
//!
//! The engine never opens files. A [`SessionSource`] hands out fresh,
//! independent forward passes over a recorded session, and a [`SessionSink`]
//! receives the rewritten log. [`MemorySession`] implements both over a
//! `Vec` and is what the tests and benchmarks drive the engine with.

use crate::{
    error::{Error, Result},
    StreamName,
};
use serde::{Deserialize, Serialize};

/// Description of one stream in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    /// Logical channel name (e.g. `/cam_left/image_raw`)
    pub name: StreamName,
    /// Message type carried on the stream
    #[serde(default)]
    pub message_type: String,
    /// Serialization of the payload bytes (e.g. `cdr`, `json`)
    #[serde(default)]
    pub serialization_format: String,
}

impl StreamMetadata {
    /// Create metadata for a typed stream.
    pub fn new(
        name: impl Into<StreamName>,
        message_type: impl Into<String>,
        serialization_format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
            serialization_format: serialization_format.into(),
        }
    }

    /// Metadata for a stream whose type is unknown.
    pub fn untyped(name: impl Into<StreamName>) -> Self {
        Self::new(name, "", "")
    }
}

/// One message as stored in the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Stream the message belongs to
    pub stream: StreamName,
    /// Opaque payload bytes
    pub data: Vec<u8>,
    /// Arrival (log) time in nanoseconds
    pub log_time: i64,
}

impl Message {
    /// Create a message.
    pub fn new(stream: impl Into<StreamName>, data: Vec<u8>, log_time: i64) -> Self {
        Self {
            stream: stream.into(),
            data,
            log_time,
        }
    }
}

/// A single forward pass over a session.
pub type MessageIter<'a> = Box<dyn Iterator<Item = Result<Message>> + 'a>;

/// A recorded session that can be read front to back, any number of times.
pub trait SessionSource {
    /// All streams present in the session.
    fn streams(&self) -> Result<Vec<StreamMetadata>>;

    /// Open a new forward pass in original arrival order.
    fn messages(&self) -> Result<MessageIter<'_>>;
}

/// Destination for a rewritten session.
pub trait SessionSink {
    /// Declare a stream before anything is written on it.
    fn declare_stream(&mut self, metadata: &StreamMetadata) -> Result<()>;

    /// Append one message.
    fn write(&mut self, stream: &str, data: &[u8], log_time: i64) -> Result<()>;

    /// Flush any buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An in-memory session log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySession {
    streams: Vec<StreamMetadata>,
    messages: Vec<Message>,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream declaration (builder style).
    pub fn with_stream(mut self, metadata: StreamMetadata) -> Self {
        self.add_stream(metadata);
        self
    }

    /// Add a stream declaration, ignoring repeats of the same name.
    pub fn add_stream(&mut self, metadata: StreamMetadata) {
        if !self.has_stream(&metadata.name) {
            self.streams.push(metadata);
        }
    }

    /// Check if a stream is declared.
    pub fn has_stream(&self, name: &str) -> bool {
        self.streams.iter().any(|s| s.name == name)
    }

    /// Append a message, declaring its stream if needed.
    pub fn push(&mut self, stream: impl Into<StreamName>, data: Vec<u8>, log_time: i64) {
        let stream = stream.into();
        if !self.has_stream(&stream) {
            self.streams.push(StreamMetadata::untyped(stream.clone()));
        }
        self.messages.push(Message::new(stream, data, log_time));
    }

    /// All messages in arrival order.
    pub fn log(&self) -> &[Message] {
        &self.messages
    }

    /// Messages of one stream in arrival order.
    pub fn stream_messages<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Message> {
        self.messages.iter().filter(move |m| m.stream == name)
    }

    /// Total message count.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the session holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl SessionSource for MemorySession {
    fn streams(&self) -> Result<Vec<StreamMetadata>> {
        Ok(self.streams.clone())
    }

    fn messages(&self) -> Result<MessageIter<'_>> {
        Ok(Box::new(self.messages.iter().cloned().map(Ok)))
    }
}

impl SessionSink for MemorySession {
    fn declare_stream(&mut self, metadata: &StreamMetadata) -> Result<()> {
        self.add_stream(metadata.clone());
        Ok(())
    }

    fn write(&mut self, stream: &str, data: &[u8], log_time: i64) -> Result<()> {
        if !self.has_stream(stream) {
            return Err(Error::UndeclaredStream(stream.to_string()));
        }
        self.messages
            .push(Message::new(stream, data.to_vec(), log_time));
        Ok(())
    }
}
