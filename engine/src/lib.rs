//! # Stampsync Engine
//!
//! A deterministic timestamp synchronization engine for recorded sensor
//! sessions.
//!
//! This crate audits how well several camera-like streams line up against a
//! reference stream, and rewrites a session so that its streams share one
//! time base. The same session and configuration always produce the same
//! report and the same output.
//!
//! ## Design Principles
//!
//! - **No IO**: Sessions and payload formats are reached through traits
//! - **Deterministic**: Same inputs always produce same outputs
//! - **Streaming rewrite**: Payloads are never buffered, only timestamps
//! - **Integer time**: All arithmetic is on signed 64-bit nanoseconds
//!
//! ## Core Concepts
//!
//! ### Sessions
//!
//! A session is an ordered log of [`Message`]s on named streams. Engine code
//! reads one through [`SessionSource`] and writes one through
//! [`SessionSink`]. [`MemorySession`] implements both.
//!
//! ### Codecs
//!
//! A [`Codec`] decodes a payload far enough to read and replace its header
//! [`Stamp`]. [`FixedHeaderCodec`] is a minimal binary layout used in tests
//! and benchmarks.
//!
//! ### Audit
//!
//! [`run_audit`] reports duplicate header times per stream and pairs every
//! reference timestamp with its nearest forward target using
//! [`ForwardMatcher`].
//!
//! ### Resequencing
//!
//! [`Resequencer`] finds the earliest timestamp shared by every sync stream
//! (the [`Anchor`]), shifts each independently clocked stream onto it by a
//! [`DomainOffset`], and rewrites the session:
//! - sync streams lose consecutive repeated header times
//! - offset streams are re-stamped
//! - every other stream passes through unchanged
//!
//! ## Quick Start
//!
//! ```rust
//! use stampsync_engine::{
//!     FixedHeaderCodec, MemorySession, ResequenceConfig, Resequencer, Timestamp,
//! };
//!
//! // 1. Record a session
//! let mut session = MemorySession::new();
//! for (cam, imu) in [(0, -100), (1000, 900), (1000, 900), (2000, 1900)] {
//!     for stream in ["/cam_left", "/cam_right"] {
//!         let payload = FixedHeaderCodec::payload_at(Timestamp::from_nanos(cam), b"");
//!         session.push(stream, payload, cam);
//!     }
//!     let payload = FixedHeaderCodec::payload_at(Timestamp::from_nanos(imu), b"");
//!     session.push("/imu/data", payload, imu);
//! }
//!
//! // 2. Configure the roles
//! let config = ResequenceConfig::new(["/cam_left", "/cam_right"])
//!     .with_offset_stream("/imu/data");
//!
//! // 3. Rewrite
//! let mut output = MemorySession::new();
//! let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
//!     .run(&mut output)
//!     .unwrap();
//!
//! assert_eq!(report.anchor.timestamp.as_nanos(), 0);
//! assert_eq!(report.offsets[0].offset.as_nanos(), 100);
//! assert_eq!(report.stats.dropped.len(), 2);
//! assert_eq!(output.len(), 10);
//! ```
//!
//! ## Cadence
//!
//! [`analyze_cadence`] summarizes the intervals of one stream against an
//! expected period.

pub mod anchor;
pub mod audit;
pub mod cadence;
pub mod codec;
pub mod collect;
pub mod duplicates;
pub mod error;
pub mod matcher;
pub mod offset;
pub mod pipeline;
pub mod resequence;
pub mod session;
pub mod timestamp;

// Re-export main types at crate root
pub use anchor::{resolve_anchor, Anchor, MIN_ANCHOR_STREAMS};
pub use audit::{run_audit, AuditConfig, AuditReport, StreamCheck, TargetAudit};
pub use cadence::{analyze_cadence, CadenceConfig, CadenceReport};
pub use codec::{Codec, FixedHeaderCodec, HeaderRecord, Stamped};
pub use collect::{StreamTimestamps, TimestampCollector};
pub use duplicates::{find_duplicates, Duplicate};
pub use error::{Error, Result};
pub use matcher::{match_forward, ForwardMatcher, MatchReport, MatchResult, ScanMode};
pub use offset::{compute_offset, DomainOffset, OffsetDomain};
pub use pipeline::{
    PreparedRun, ResequenceConfig, ResequenceReport, Resequencer, SyncStreamSummary,
};
pub use resequence::{
    resequence, resequence_declared, Disposition, DroppedDuplicate, ResequencePlan, ResequencingWriter, StreamRole,
    WriteStats,
};
pub use session::{
    MemorySession, Message, MessageIter, SessionSink, SessionSource, StreamMetadata,
};
pub use timestamp::{Stamp, Timestamp, NANOS_PER_SEC};

/// Type aliases for clarity
pub type StreamName = String;
