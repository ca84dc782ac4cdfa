//! Error types for the stampsync engine.

use crate::StreamName;
use thiserror::Error;

/// All possible errors from the stampsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Timestamp errors
    #[error("nanosecond field out of range: {0} (must be below 1000000000)")]
    InvalidNanoseconds(u32),

    #[error("timestamp arithmetic overflowed i64 nanoseconds")]
    TimestampOverflow,

    // Stream errors
    #[error("no messages on stream: {0}")]
    EmptyStream(StreamName),

    #[error("no timestamp present on all of: {}", .0.join(", "))]
    NoCommonTimestamp(Vec<StreamName>),

    #[error("anchor resolution needs at least {required} streams, got {actual}")]
    InsufficientStreams { required: usize, actual: usize },

    #[error("stream not declared on writer: {0}")]
    UndeclaredStream(StreamName),

    #[error("stream not found in session: {0}")]
    UnknownStream(StreamName),

    #[error("stream configured with more than one role: {0}")]
    ConflictingRole(StreamName),

    // Collaborator errors
    #[error("failed to decode message on '{stream}': {reason}")]
    Decode { stream: StreamName, reason: String },

    #[error("failed to encode message on '{stream}': {reason}")]
    Encode { stream: StreamName, reason: String },

    #[error("session source error: {0}")]
    Source(String),

    #[error("session sink error: {0}")]
    Sink(String),

    #[error("report serialization failed: {0}")]
    Report(String),
}

impl Error {
    /// Build a decode error for a stream.
    pub fn decode(stream: impl Into<StreamName>, reason: impl ToString) -> Self {
        Error::Decode {
            stream: stream.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an encode error for a stream.
    pub fn encode(stream: impl Into<StreamName>, reason: impl ToString) -> Self {
        Error::Encode {
            stream: stream.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
